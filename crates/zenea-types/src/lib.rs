//! Foundation types for Zenea block storage.
//!
//! Every piece of data in Zenea is stored as an immutable [`Block`]: a byte
//! buffer of at most [`Block::MAX_BYTES`] bytes, identified by the
//! cryptographic hash of its content. Every other Zenea crate depends on
//! `zenea-types`.
//!
//! # Key Types
//!
//! - [`Algorithm`] — Supported hashing algorithms (currently SHA2-256)
//! - [`BlockId`] — Content-derived identifier, textual form `sha2-256-<hex>`
//! - [`Block`] — Identifier plus content, with the [`Block::matches`] integrity check

pub mod block;
pub mod error;
pub mod id;

pub use block::Block;
pub use error::{BlockError, IdError};
pub use id::{Algorithm, BlockId};
