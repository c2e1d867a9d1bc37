use zenea_types::Block;

/// Errors from listing the blocks available in a storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("unable to list blocks")]
    Unable,
}

/// Errors from probing a storage for a block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("unable to check block")]
    Unable,
}

/// Errors from fetching a block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The storage does not hold the block.
    #[error("block not found")]
    NotFound,

    /// Content was retrieved but does not hash to the requested identifier.
    #[error("block content does not match its identifier")]
    InvalidContent,

    #[error("unable to fetch block")]
    Unable,
}

/// Errors from putting a block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PutError {
    /// The content exceeds [`Block::MAX_BYTES`].
    #[error("block content exceeds {} bytes", Block::MAX_BYTES)]
    Overflow,

    /// The storage is temporarily unavailable; the put may be retried.
    #[error("storage unavailable")]
    Unavailable,

    #[error("not permitted to put blocks")]
    NotPermitted,

    /// The block is already stored. Carries the stored block so callers can
    /// treat this as success without fetching it again.
    #[error("block already exists: {}", .0.id())]
    Exists(Block),

    #[error("unable to put block")]
    Unable,
}

impl PutError {
    /// The block carried by [`PutError::Exists`], if any.
    pub fn existing(&self) -> Option<&Block> {
        match self {
            Self::Exists(block) => Some(block),
            _ => None,
        }
    }
}
