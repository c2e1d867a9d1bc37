use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;
use zenea_types::{Block, BlockId};

use crate::content::BlockContent;
use crate::error::{CheckError, FetchError, ListError, PutError};
use crate::policy::{fold_puts, warn_put_failure, CheckFallback, FetchFallback};
use crate::traits::BlockStorage;

/// Two storages of independent types combined with the same policy as
/// [`StorageList`](crate::StorageList): `first` is consulted before `second`
/// on reads, and both receive every put.
///
/// The first slot is optional, so a pair can express "maybe A, then B"
/// without erasing either concrete type.
pub struct StoragePair<A, B> {
    first: Option<A>,
    second: B,
}

impl<A, B> StoragePair<A, B> {
    pub fn new(first: Option<A>, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> Option<&A> {
        self.first.as_ref()
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn into_parts(self) -> (Option<A>, B) {
        (self.first, self.second)
    }
}

async fn put_optional<S: BlockStorage>(
    source: Option<&S>,
    data: Bytes,
) -> Option<Result<Block, PutError>> {
    match source {
        Some(source) => Some(source.put_data(data).await),
        None => None,
    }
}

#[async_trait]
impl<A: BlockStorage, B: BlockStorage> BlockStorage for StoragePair<A, B> {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        let first = async {
            match &self.first {
                Some(first) => Some(first.list_blocks().await),
                None => None,
            }
        };
        let (first, second) = futures::join!(first, self.second.list_blocks());

        let mut result = HashSet::new();
        if let Some(listing) = first {
            match listing {
                Ok(blocks) => result.extend(blocks),
                Err(err) => warn!(error = %err, "skipping first source in listing"),
            }
        }
        match second {
            Ok(blocks) => result.extend(blocks),
            Err(err) => warn!(error = %err, "skipping second source in listing"),
        }
        Ok(result)
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        let mut fold = CheckFallback::new();
        if let Some(first) = &self.first {
            if fold.offer(first.check_block(id).await) {
                return Ok(true);
            }
        }
        if fold.offer(self.second.check_block(id).await) {
            return Ok(true);
        }
        fold.finish()
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        let mut fold = FetchFallback::new(id);
        if let Some(first) = &self.first {
            let result = first.fetch_block(id).await;
            if let Some(block) = fold.offer(first, result) {
                return Ok(block);
            }
        }
        let result = self.second.fetch_block(id).await;
        if let Some(block) = fold.offer(&self.second, result) {
            return Ok(block);
        }
        Err(fold.finish())
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        let data = content.read_block_sized().await?;
        let (first, second) = futures::join!(
            put_optional(self.first.as_ref(), data.clone()),
            self.second.put_data(data),
        );
        if let (Some(source), Some(result)) = (&self.first, &first) {
            warn_put_failure(source, result);
        }
        warn_put_failure(&self.second, &second);
        fold_puts(first.into_iter().chain(std::iter::once(second)))
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for StoragePair<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.first {
            Some(first) => write!(f, "{first}, {}", self.second),
            None => write!(f, "{}", self.second),
        }
    }
}
