//! Filesystem block storage for Zenea.
//!
//! [`BlockFs`] stores each block as a plain file under a three-level shard
//! tree, bounding directory fan-out to 256 x 256 regardless of corpus size:
//!
//! ```text
//! <base>/blocks/2c/f2/4dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824
//! ```
//!
//! Files contain the raw block bytes with no framing. Every fetch re-hashes
//! the file and reports a mismatch as
//! [`FetchError::InvalidContent`](zenea_store::FetchError::InvalidContent).

pub mod shard;
pub mod store;

pub use store::BlockFs;
