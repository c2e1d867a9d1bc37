//! The Zenea HTTP block protocol.
//!
//! | Operation | Request | Success | Failure |
//! |---|---|---|---|
//! | fetch | `GET /block/{id}` | 200, raw content | 404 not found, other unable |
//! | check | `HEAD /block/{id}` | 200 | 404 absent, other unable |
//! | put | `POST /block`, raw content | 200, id text | 502 unavailable, 403 not permitted, other unable |
//! | list | `GET /blocks` | 200, comma-separated ids | any other status |
//!
//! [`HttpBlockStorage`] is the client side. The [`status`] functions are the
//! server side, shared with `zenea-server`.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod status;

pub use client::HttpBlockStorage;
pub use endpoint::{endpoints, RemoteEndpoint, Scheme, DEFAULT_PORT};
pub use error::EndpointError;
