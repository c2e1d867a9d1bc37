use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use zenea_types::{Block, BlockId};

use crate::content::BlockContent;
use crate::error::{CheckError, FetchError, ListError, PutError};

/// Content-addressed block storage.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable once stored; a put never overwrites existing content.
/// - The identifier of a put block is derived from its content, never supplied.
/// - Every block returned by `fetch_block` matches the requested identifier.
/// - Underlying I/O and transport failures are translated into the declared
///   error kinds; nothing else escapes.
///
/// The [`Display`](fmt::Display) form describes the storage's identity and
/// configuration; combinators compose it from their children's descriptions.
#[async_trait]
pub trait BlockStorage: fmt::Display + Send + Sync {
    /// Best-effort enumeration of every block currently retrievable.
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError>;

    /// Whether a block can be fetched, without transferring its content.
    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError>;

    /// Retrieve a block and verify it against `id`.
    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError>;

    /// Store new content and return the resulting block.
    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError>;

    /// Store a single buffer.
    async fn put_data(&self, data: Bytes) -> Result<Block, PutError> {
        self.put_block(data.into()).await
    }

    /// Store the content of an already built block.
    ///
    /// Only the content is transferred; the storage derives the identifier.
    async fn put_existing(&self, block: &Block) -> Result<Block, PutError> {
        self.put_block(block.content().clone().into()).await
    }
}

/// A storage that adds behaviour on top of a single wrapped source.
///
/// Wrappers describe themselves as `name<source description>`.
pub trait StorageWrapper: BlockStorage {
    type Source: BlockStorage;

    /// Name of this wrapper alone, without the source.
    fn name(&self) -> &str;

    fn source(&self) -> &Self::Source;
}

#[async_trait]
impl<S: BlockStorage + ?Sized> BlockStorage for Arc<S> {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        (**self).list_blocks().await
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        (**self).check_block(id).await
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        (**self).fetch_block(id).await
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        (**self).put_block(content).await
    }
}

#[async_trait]
impl<S: BlockStorage + ?Sized> BlockStorage for Box<S> {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        (**self).list_blocks().await
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        (**self).check_block(id).await
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        (**self).fetch_block(id).await
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        (**self).put_block(content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlockStorage;

    #[tokio::test]
    async fn dyn_storage_through_arc_and_box() {
        let arc: Arc<dyn BlockStorage> = Arc::new(MemoryBlockStorage::new());
        let block = arc.put_data(Bytes::from_static(b"shared")).await.unwrap();
        assert!(arc.check_block(block.id()).await.unwrap());

        let boxed: Box<dyn BlockStorage> = Box::new(arc.clone());
        assert_eq!(boxed.fetch_block(block.id()).await.unwrap(), block);
        assert_eq!(boxed.to_string(), "memory");
    }

    #[tokio::test]
    async fn put_existing_rederives_id() {
        let store = MemoryBlockStorage::new();
        let block = Block::new(&b"content"[..]).unwrap();
        let stored = store.put_existing(&block).await.unwrap();
        assert_eq!(stored, block);
    }
}
