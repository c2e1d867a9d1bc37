use thiserror::Error;

/// Errors produced while parsing or constructing a [`BlockId`](crate::BlockId).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("missing '-' between algorithm and hash in {0:?}")]
    MissingSeparator(String),

    #[error("unknown hashing algorithm: {0:?}")]
    UnknownAlgorithm(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors produced while constructing a [`Block`](crate::Block).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("block content too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
}
