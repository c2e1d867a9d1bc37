use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zenea_types::{Block, BlockId};

use crate::content::BlockContent;
use crate::error::{CheckError, FetchError, ListError, PutError};
use crate::traits::{BlockStorage, StorageWrapper};

/// Known identifiers plus materialized content.
///
/// Invariant: every key of `blocks` is in `index`.
#[derive(Default)]
struct CacheState {
    index: HashSet<BlockId>,
    blocks: HashMap<BlockId, Block>,
}

impl CacheState {
    fn remember(&mut self, block: &Block) {
        self.index.insert(*block.id());
        self.blocks.insert(*block.id(), block.clone());
    }
}

/// A storage wrapper that caches the source's block index and content.
///
/// `list_blocks` answers from the cached index without I/O; the index is
/// only refreshed by [`BlockCache::update_list`], which also evicts content
/// for identifiers the source no longer lists.
///
/// Operations that touch the source (`check_block`, `fetch_block`,
/// `put_block`, `update_list`) are serialized per cache instance, so each
/// read-modify-write of the cache state is atomic. `list_blocks` only takes
/// a brief read lock and never waits on the source.
pub struct BlockCache<S> {
    source: S,
    state: RwLock<CacheState>,
    writer: Mutex<()>,
}

impl<S: BlockStorage> BlockCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: RwLock::new(CacheState::default()),
            writer: Mutex::new(()),
        }
    }

    /// Re-list the source, replace the index and evict stale content.
    pub async fn update_list(&self) -> Result<(), ListError> {
        let _writer = self.writer.lock().await;
        let listed = self.source.list_blocks().await?;

        let mut state = self.state.write();
        let before = state.blocks.len();
        state.blocks.retain(|id, _| listed.contains(id));
        let evicted = before - state.blocks.len();
        state.index = listed;
        info!(
            source = %self.source,
            listed = state.index.len(),
            evicted,
            "cache index refreshed"
        );
        Ok(())
    }

    /// Whether the content of `id` is held in memory.
    pub fn is_cached(&self, id: &BlockId) -> bool {
        self.state.read().blocks.contains_key(id)
    }

    /// Number of identifiers in the index.
    pub fn index_len(&self) -> usize {
        self.state.read().index.len()
    }

    /// Number of blocks whose content is held in memory.
    pub fn cached_len(&self) -> usize {
        self.state.read().blocks.len()
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

#[async_trait]
impl<S: BlockStorage> BlockStorage for BlockCache<S> {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        Ok(self.state.read().index.clone())
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        let _writer = self.writer.lock().await;
        if self.state.read().index.contains(id) {
            return Ok(true);
        }

        let present = self.source.check_block(id).await?;
        if present {
            self.state.write().index.insert(*id);
        }
        Ok(present)
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        let _writer = self.writer.lock().await;
        let cached = self.state.read().blocks.get(id).cloned();
        if let Some(block) = cached {
            debug!(%id, "cache hit");
            return Ok(block);
        }

        let block = self.source.fetch_block(id).await?;
        self.state.write().remember(&block);
        Ok(block)
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        let _writer = self.writer.lock().await;
        let result = self.source.put_block(content).await;
        match &result {
            Ok(block) | Err(PutError::Exists(block)) => self.state.write().remember(block),
            Err(_) => {}
        }
        result
    }
}

impl<S: BlockStorage> StorageWrapper for BlockCache<S> {
    type Source = S;

    fn name(&self) -> &str {
        "cache"
    }

    fn source(&self) -> &S {
        &self.source
    }
}

impl<S: fmt::Display> fmt::Display for BlockCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache<{}>", self.source)
    }
}
