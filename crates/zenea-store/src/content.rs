use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use zenea_types::Block;

use crate::error::PutError;

/// Content handed to [`BlockStorage::put_block`](crate::BlockStorage::put_block)
/// as a lazy sequence of byte chunks.
///
/// Callers may stream a payload without buffering it up front; storages read
/// it with [`BlockContent::read`], which stops as soon as the size limit is
/// exceeded.
pub struct BlockContent {
    chunks: BoxStream<'static, io::Result<Bytes>>,
}

/// Errors from collecting a [`BlockContent`] stream.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content exceeds {limit} bytes")]
    Overflow { limit: usize },

    #[error("reading content failed: {0}")]
    Io(#[from] io::Error),
}

impl From<ContentError> for PutError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Overflow { .. } => PutError::Overflow,
            ContentError::Io(_) => PutError::Unable,
        }
    }
}

impl BlockContent {
    /// Wrap an arbitrary chunk stream.
    pub fn new<S>(chunks: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            chunks: chunks.boxed(),
        }
    }

    /// Content made of already-available chunks.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::new(stream::iter(chunks.into_iter().map(Ok)))
    }

    pub fn empty() -> Self {
        Self::new(stream::empty())
    }

    /// Collect all chunks into one buffer of at most `limit` bytes.
    pub async fn read(mut self, limit: usize) -> Result<Bytes, ContentError> {
        let mut single: Option<Bytes> = None;
        let mut buf = BytesMut::new();
        let mut total = 0usize;

        while let Some(chunk) = self.chunks.next().await {
            let chunk = chunk?;
            total += chunk.len();
            if total > limit {
                return Err(ContentError::Overflow { limit });
            }
            // A single chunk is returned as-is without copying.
            match single.take() {
                None if buf.is_empty() => single = Some(chunk),
                previous => {
                    if let Some(previous) = previous {
                        buf.extend_from_slice(&previous);
                    }
                    buf.extend_from_slice(&chunk);
                }
            }
        }

        Ok(single.unwrap_or_else(|| buf.freeze()))
    }

    /// Collect the content with the block size ceiling applied.
    pub async fn read_block_sized(self) -> Result<Bytes, ContentError> {
        self.read(Block::MAX_BYTES).await
    }
}

impl fmt::Debug for BlockContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockContent").finish_non_exhaustive()
    }
}

impl From<Bytes> for BlockContent {
    fn from(data: Bytes) -> Self {
        Self::from_chunks(std::iter::once(data))
    }
}

impl From<Vec<u8>> for BlockContent {
    fn from(data: Vec<u8>) -> Self {
        Bytes::from(data).into()
    }
}

impl From<&'static [u8]> for BlockContent {
    fn from(data: &'static [u8]) -> Self {
        Bytes::from_static(data).into()
    }
}

impl From<&'static str> for BlockContent {
    fn from(data: &'static str) -> Self {
        Bytes::from_static(data.as_bytes()).into()
    }
}

impl From<Block> for BlockContent {
    fn from(block: Block) -> Self {
        block.into_content().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_single_chunk() {
        let data = BlockContent::from("hello").read(16).await.unwrap();
        assert_eq!(data.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn read_concatenates_chunks() {
        let content = BlockContent::from_chunks(vec![
            Bytes::from_static(b"he"),
            Bytes::from_static(b"ll"),
            Bytes::from_static(b"o"),
        ]);
        assert_eq!(content.read(16).await.unwrap().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn read_empty() {
        assert!(BlockContent::empty().read(16).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_stops_at_limit() {
        let exact = BlockContent::from(vec![1u8; 8]).read(8).await.unwrap();
        assert_eq!(exact.len(), 8);

        let chunks = (0..4).map(|_| Bytes::from(vec![0u8; 4])).collect::<Vec<_>>();
        let err = BlockContent::from_chunks(chunks).read(10).await.unwrap_err();
        assert!(matches!(err, ContentError::Overflow { limit: 10 }));
        assert_eq!(PutError::from(err), PutError::Overflow);
    }

    #[tokio::test]
    async fn read_propagates_stream_errors() {
        let content = BlockContent::new(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        ]));
        let err = content.read(64).await.unwrap_err();
        assert!(matches!(err, ContentError::Io(_)));
        assert_eq!(PutError::from(err), PutError::Unable);
    }

    #[tokio::test]
    async fn block_size_ceiling() {
        let max = BlockContent::from(vec![0u8; Block::MAX_BYTES]);
        assert!(max.read_block_sized().await.is_ok());
        let over = BlockContent::from(vec![0u8; Block::MAX_BYTES + 1]);
        assert!(over.read_block_sized().await.is_err());
    }
}
