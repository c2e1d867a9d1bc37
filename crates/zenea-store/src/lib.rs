//! Block storage for Zenea.
//!
//! This crate defines the uniform interface every Zenea block storage
//! implements, and the combinators that compose several storages into one
//! topology behind that same interface.
//!
//! # Storage Interface
//!
//! [`BlockStorage`] has four operations, each with its own closed error type:
//!
//! - `list_blocks` -> [`ListError`]
//! - `check_block` -> [`CheckError`]
//! - `fetch_block` -> [`FetchError`]
//! - `put_block` -> [`PutError`]
//!
//! Content is put as a [`BlockContent`] chunk stream; the identifier is always
//! derived from the content, never supplied by the caller.
//!
//! # Backends and Combinators
//!
//! - [`MemoryBlockStorage`] -- `HashMap`-based store for tests and embedding
//! - [`BlockCache`] -- in-memory index and content cache over one source
//! - [`StorageList`] -- N homogeneous sources, read fallback, write fan-out
//! - [`StoragePair`] -- two heterogeneous sources with the same policy
//! - [`StorageEither`] -- one of two statically typed branches
//! - [`Topology`], [`branch`], [`sequence`], [`chain!`] -- declarative assembly
//!
//! # Design Rules
//!
//! 1. Blocks are immutable; a storage never overwrites stored content.
//! 2. Every block read from an untrusted medium is checked with [`Block::matches`](zenea_types::Block::matches).
//! 3. Leaf backends translate every underlying failure into a declared error kind.
//! 4. Combinators never invent error kinds; they select among their children's.

pub mod builder;
pub mod cache;
pub mod content;
pub mod either;
pub mod error;
pub mod list;
pub mod memory;
pub mod pair;
mod policy;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use builder::{branch, fallback, sequence, Topology};
pub use cache::BlockCache;
pub use content::{BlockContent, ContentError};
pub use either::StorageEither;
pub use error::{CheckError, FetchError, ListError, PutError};
pub use list::StorageList;
pub use memory::MemoryBlockStorage;
pub use pair::StoragePair;
pub use traits::{BlockStorage, StorageWrapper};
