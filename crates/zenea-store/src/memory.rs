use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;
use zenea_types::{Block, BlockId};

use crate::content::BlockContent;
use crate::error::{CheckError, FetchError, ListError, PutError};
use crate::traits::BlockStorage;

/// In-memory, HashMap-based block storage.
///
/// Intended for tests and embedding. Blocks are held behind a `RwLock` for
/// safe concurrent access and cloned cheaply on read.
pub struct MemoryBlockStorage {
    blocks: RwLock<HashMap<BlockId, Block>>,
}

impl MemoryBlockStorage {
    /// Create a new empty in-memory storage.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Returns `true` if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    /// Total content bytes across all stored blocks.
    pub fn total_bytes(&self) -> usize {
        self.blocks.read().values().map(Block::len).sum()
    }

    /// Remove a block out-of-band. Returns `true` if it was present.
    pub fn remove(&self, id: &BlockId) -> bool {
        self.blocks.write().remove(id).is_some()
    }

    /// Remove all blocks.
    pub fn clear(&self) {
        self.blocks.write().clear();
    }

    /// Store a block under its claimed identifier without verifying it.
    ///
    /// Used for fault injection: a block whose identifier does not match its
    /// content is reported as invalid content when fetched.
    pub fn insert_unchecked(&self, block: Block) {
        self.blocks.write().insert(*block.id(), block);
    }
}

impl Default for MemoryBlockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStorage for MemoryBlockStorage {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        Ok(self.blocks.read().keys().copied().collect())
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        Ok(self.blocks.read().contains_key(id))
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        let block = self
            .blocks
            .read()
            .get(id)
            .cloned()
            .ok_or(FetchError::NotFound)?;
        if !block.matches(id) {
            return Err(FetchError::InvalidContent);
        }
        Ok(block)
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        let data = content.read_block_sized().await?;
        let block = Block::new(data).map_err(|_| PutError::Overflow)?;

        let mut map = self.blocks.write();
        if let Some(existing) = map.get(block.id()) {
            return Err(PutError::Exists(existing.clone()));
        }
        map.insert(*block.id(), block.clone());
        Ok(block)
    }
}

impl fmt::Display for MemoryBlockStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory")
    }
}

impl fmt::Debug for MemoryBlockStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBlockStorage")
            .field("block_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_and_fetch() {
        let store = MemoryBlockStorage::new();
        let block = store.put_block("hello world".into()).await.unwrap();
        assert_eq!(*block.id(), BlockId::from_content(b"hello world"));

        let read_back = store.fetch_block(block.id()).await.unwrap();
        assert_eq!(read_back, block);
    }

    #[tokio::test]
    async fn fetch_missing_is_not_found() {
        let store = MemoryBlockStorage::new();
        let id = BlockId::from_content(b"missing");
        assert_eq!(store.fetch_block(&id).await, Err(FetchError::NotFound));
        assert!(!store.check_block(&id).await.unwrap());
    }

    #[tokio::test]
    async fn second_put_reports_exists() {
        let store = MemoryBlockStorage::new();
        let first = store.put_block("twice".into()).await.unwrap();
        let second = store.put_block("twice".into()).await;
        assert_eq!(second, Err(PutError::Exists(first)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn put_rejects_oversize() {
        let store = MemoryBlockStorage::new();
        let result = store.put_block(vec![0u8; Block::MAX_BYTES + 1].into()).await;
        assert_eq!(result, Err(PutError::Overflow));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn list_contains_all() {
        let store = MemoryBlockStorage::new();
        let a = store.put_data(Bytes::from_static(b"a")).await.unwrap();
        let b = store.put_data(Bytes::from_static(b"b")).await.unwrap();
        let listed = store.list_blocks().await.unwrap();
        assert_eq!(listed, HashSet::from([*a.id(), *b.id()]));
    }

    // -----------------------------------------------------------------------
    // Out-of-band changes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn remove_and_clear() {
        let store = MemoryBlockStorage::new();
        let block = store.put_block("gone soon".into()).await.unwrap();
        assert!(store.remove(block.id()));
        assert!(!store.remove(block.id()));
        assert_eq!(store.fetch_block(block.id()).await, Err(FetchError::NotFound));

        store.put_block("x".into()).await.unwrap();
        store.clear();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn corrupted_block_is_invalid_content() {
        let store = MemoryBlockStorage::new();
        let claimed = BlockId::from_content(b"original");
        store.insert_unchecked(Block::with_id(claimed, &b"tampered"[..]).unwrap());
        assert_eq!(store.fetch_block(&claimed).await, Err(FetchError::InvalidContent));
    }

    #[tokio::test]
    async fn total_bytes_and_debug() {
        let store = MemoryBlockStorage::default();
        store.put_block("12345".into()).await.unwrap();
        store.put_block("123456789".into()).await.unwrap();
        assert_eq!(store.total_bytes(), 14);
        let debug = format!("{store:?}");
        assert!(debug.contains("block_count: 2"));
    }
}
