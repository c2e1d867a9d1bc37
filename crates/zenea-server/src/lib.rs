//! HTTP server for Zenea block storage.
//!
//! Exposes one storage topology over the block protocol described in
//! `zenea-http`. The topology is assembled from a [`ServerConfig`]: a local
//! filesystem store, upstream fallbacks, and an optional cache.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod topology;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::ZeneaServer;
pub use topology::{assemble, ServedStorage, SourceSpec, SourceSpecError};
