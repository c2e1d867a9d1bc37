use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use zenea_types::{Block, BlockId};

use crate::content::BlockContent;
use crate::error::{CheckError, FetchError, ListError, PutError};
use crate::traits::BlockStorage;

/// Exactly one of two statically typed storages, chosen once at construction.
///
/// Every operation is forwarded to the selected branch. This lets a topology
/// say "A if condition, else B" while both branch types stay visible.
#[derive(Debug, Clone)]
pub enum StorageEither<A, B> {
    First(A),
    Second(B),
}

impl<A, B> StorageEither<A, B> {
    pub fn first(&self) -> Option<&A> {
        match self {
            Self::First(a) => Some(a),
            Self::Second(_) => None,
        }
    }

    pub fn second(&self) -> Option<&B> {
        match self {
            Self::First(_) => None,
            Self::Second(b) => Some(b),
        }
    }

    pub fn is_first(&self) -> bool {
        matches!(self, Self::First(_))
    }
}

#[async_trait]
impl<A: BlockStorage, B: BlockStorage> BlockStorage for StorageEither<A, B> {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        match self {
            Self::First(a) => a.list_blocks().await,
            Self::Second(b) => b.list_blocks().await,
        }
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        match self {
            Self::First(a) => a.check_block(id).await,
            Self::Second(b) => b.check_block(id).await,
        }
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        match self {
            Self::First(a) => a.fetch_block(id).await,
            Self::Second(b) => b.fetch_block(id).await,
        }
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        match self {
            Self::First(a) => a.put_block(content).await,
            Self::Second(b) => b.put_block(content).await,
        }
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for StorageEither<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First(a) => a.fmt(f),
            Self::Second(b) => b.fmt(f),
        }
    }
}
