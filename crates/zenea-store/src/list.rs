use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};
use zenea_types::{Block, BlockId};

use crate::content::BlockContent;
use crate::error::{CheckError, FetchError, ListError, PutError};
use crate::policy::{fold_puts, warn_put_failure, CheckFallback, FetchFallback};
use crate::traits::BlockStorage;

/// A multi-source storage over a list of same-type sources.
///
/// - `list_blocks` is the union of every source that lists successfully.
/// - `check_block` and `fetch_block` try sources in order and return the
///   first success.
/// - `put_block` replicates to every source concurrently and returns the
///   most recent success in source order.
pub struct StorageList<S> {
    sources: Vec<S>,
}

impl<S> StorageList<S> {
    pub fn new(sources: Vec<S>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    pub fn push(&mut self, source: S) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn into_inner(self) -> Vec<S> {
        self.sources
    }
}

impl<S> FromIterator<S> for StorageList<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl<S: BlockStorage> BlockStorage for StorageList<S> {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        let listings = join_all(self.sources.iter().map(|s| s.list_blocks())).await;

        let mut result = HashSet::new();
        for (source, listing) in self.sources.iter().zip(listings) {
            match listing {
                Ok(blocks) => result.extend(blocks),
                Err(err) => warn!(source = %source, error = %err, "skipping source in listing"),
            }
        }
        Ok(result)
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        let mut fold = CheckFallback::new();
        for source in &self.sources {
            if fold.offer(source.check_block(id).await) {
                return Ok(true);
            }
        }
        fold.finish()
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        let mut fold = FetchFallback::new(id);
        for source in &self.sources {
            let result = source.fetch_block(id).await;
            if let Some(block) = fold.offer(source, result) {
                return Ok(block);
            }
        }
        Err(fold.finish())
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        // Every source needs its own copy, so the stream is read once here.
        let data = content.read_block_sized().await?;
        let results = join_all(self.sources.iter().map(|s| s.put_data(data.clone()))).await;

        for (source, result) in self.sources.iter().zip(&results) {
            warn_put_failure(source, result);
        }
        let result = fold_puts(results);
        debug!(sources = self.sources.len(), ok = result.is_ok(), "fanned out put");
        result
    }
}

impl<S: fmt::Display> fmt::Display for StorageList<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{source}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlockStorage;
    use std::sync::Arc;

    /// A source that fails every operation.
    struct Broken;

    #[async_trait]
    impl BlockStorage for Broken {
        async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
            Err(ListError::Unable)
        }
        async fn check_block(&self, _id: &BlockId) -> Result<bool, CheckError> {
            Err(CheckError::Unable)
        }
        async fn fetch_block(&self, _id: &BlockId) -> Result<Block, FetchError> {
            Err(FetchError::Unable)
        }
        async fn put_block(&self, _content: BlockContent) -> Result<Block, PutError> {
            Err(PutError::Unavailable)
        }
    }

    impl fmt::Display for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("broken")
        }
    }

    fn two_sources() -> (
        Arc<MemoryBlockStorage>,
        Arc<MemoryBlockStorage>,
        StorageList<Arc<MemoryBlockStorage>>,
    ) {
        let a = Arc::new(MemoryBlockStorage::new());
        let b = Arc::new(MemoryBlockStorage::new());
        let list = StorageList::new(vec![a.clone(), b.clone()]);
        (a, b, list)
    }

    // -----------------------------------------------------------------------
    // Read fallback
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fetch_falls_back_to_second_source() {
        let (_a, b, list) = two_sources();
        let block = b.put_block("only in b".into()).await.unwrap();
        assert_eq!(list.fetch_block(block.id()).await.unwrap(), block);
        assert!(list.check_block(block.id()).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_union() {
        let (a, b, list) = two_sources();
        let x = a.put_block("x".into()).await.unwrap();
        let y = b.put_block("y".into()).await.unwrap();
        let listed = list.list_blocks().await.unwrap();
        assert_eq!(listed, HashSet::from([*x.id(), *y.id()]));
    }

    #[tokio::test]
    async fn list_skips_failing_sources() {
        let good = Arc::new(MemoryBlockStorage::new());
        let block = good.put_block("kept".into()).await.unwrap();
        let list: StorageList<Box<dyn BlockStorage>> =
            StorageList::new(vec![Box::new(Broken), Box::new(good)]);
        assert_eq!(list.list_blocks().await.unwrap(), HashSet::from([*block.id()]));
    }

    #[tokio::test]
    async fn fetch_missing_everywhere() {
        let (_a, _b, list) = two_sources();
        let id = BlockId::from_content(b"nowhere");
        assert_eq!(list.fetch_block(&id).await, Err(FetchError::NotFound));
        assert!(!list.check_block(&id).await.unwrap());
    }

    #[tokio::test]
    async fn fetch_skips_corrupt_source() {
        let corrupt = Arc::new(MemoryBlockStorage::new());
        let healthy = Arc::new(MemoryBlockStorage::new());
        let good = healthy.put_block("payload".into()).await.unwrap();
        corrupt.insert_unchecked(Block::with_id(*good.id(), &b"garbage"[..]).unwrap());

        let list = StorageList::new(vec![corrupt.clone(), healthy]);
        assert_eq!(list.fetch_block(good.id()).await.unwrap(), good);

        let only_corrupt = StorageList::new(vec![corrupt]);
        assert_eq!(
            only_corrupt.fetch_block(good.id()).await,
            Err(FetchError::InvalidContent)
        );
    }

    #[tokio::test]
    async fn all_sources_failing() {
        let list: StorageList<Broken> = StorageList::new(vec![Broken, Broken]);
        let id = BlockId::from_content(b"x");
        assert_eq!(list.check_block(&id).await, Err(CheckError::Unable));
        assert_eq!(list.fetch_block(&id).await, Err(FetchError::Unable));
        assert_eq!(list.put_block("x".into()).await, Err(PutError::Unable));
        assert!(list.list_blocks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_list_defaults() {
        let list: StorageList<MemoryBlockStorage> = StorageList::new(Vec::new());
        let id = BlockId::from_content(b"x");
        assert_eq!(list.fetch_block(&id).await, Err(FetchError::NotFound));
        assert_eq!(list.check_block(&id).await, Ok(false));
        assert_eq!(list.put_block("x".into()).await, Err(PutError::Unable));
    }

    // -----------------------------------------------------------------------
    // Write fan-out
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_replicates_to_all() {
        let (a, b, list) = two_sources();
        let block = list.put_block("replicated".into()).await.unwrap();
        assert!(a.check_block(block.id()).await.unwrap());
        assert!(b.check_block(block.id()).await.unwrap());
    }

    #[tokio::test]
    async fn put_prefers_success_over_exists() {
        let (a, _b, list) = two_sources();
        a.put_block("partial".into()).await.unwrap();
        let block = list.put_block("partial".into()).await.unwrap();
        assert_eq!(*block.id(), BlockId::from_content(b"partial"));
    }

    #[tokio::test]
    async fn put_everywhere_existing_reports_exists() {
        let (_a, _b, list) = two_sources();
        let first = list.put_block("dup".into()).await.unwrap();
        assert_eq!(list.put_block("dup".into()).await, Err(PutError::Exists(first)));
    }

    #[tokio::test]
    async fn put_survives_broken_source() {
        let good = Arc::new(MemoryBlockStorage::new());
        let list: StorageList<Box<dyn BlockStorage>> =
            StorageList::new(vec![Box::new(good.clone()), Box::new(Broken)]);
        let block = list.put_block("resilient".into()).await.unwrap();
        assert!(good.check_block(block.id()).await.unwrap());
    }

    #[tokio::test]
    async fn put_oversize_is_overflow() {
        let (_a, _b, list) = two_sources();
        let result = list.put_block(vec![0u8; Block::MAX_BYTES + 1].into()).await;
        assert_eq!(result, Err(PutError::Overflow));
    }

    #[test]
    fn description_joins_sources() {
        let list = StorageList::new(vec![MemoryBlockStorage::new(), MemoryBlockStorage::new()]);
        assert_eq!(list.to_string(), "memory, memory");
        let collected: StorageList<MemoryBlockStorage> = std::iter::empty().collect();
        assert_eq!(collected.to_string(), "");
    }
}
