//! Source specs and assembly of the storage a server exposes.
//!
//! A served topology is the local filesystem store (if enabled) followed by
//! the configured upstreams, optionally wrapped in a cache:
//!
//! ```text
//! cache<fs:zenea-data, http://peer:4096, fs:/mnt/archive>
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use zenea_fs::BlockFs;
use zenea_http::{EndpointError, HttpBlockStorage, RemoteEndpoint};
use zenea_store::{
    fallback, sequence, BlockCache, StorageEither, StorageList, StoragePair, Topology,
};

use crate::config::ServerConfig;
use crate::error::ServerResult;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceSpecError {
    #[error("unrecognized source {0:?}, expected fs:<path> or http(s)://host[:port]")]
    Unknown(String),

    #[error("empty path in fs: source")]
    EmptyPath,

    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// A textual description of one storage: `fs:<path>` or `http(s)://host[:port]`.
///
/// The textual form matches the storage's own description, so a source
/// printed from a running topology can be parsed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Fs(PathBuf),
    Http(RemoteEndpoint),
}

/// A leaf storage opened from a [`SourceSpec`].
pub type Source = StorageEither<BlockFs, HttpBlockStorage>;

/// Local store followed by upstream fallbacks.
pub type Backend = StoragePair<BlockFs, StorageList<Source>>;

/// The storage a server exposes.
pub type ServedStorage = StorageEither<BlockCache<Backend>, Backend>;

impl SourceSpec {
    pub fn open(&self) -> Source {
        match self {
            Self::Fs(path) => StorageEither::First(BlockFs::new(path)),
            Self::Http(endpoint) => StorageEither::Second(HttpBlockStorage::new(endpoint.clone())),
        }
    }
}

impl FromStr for SourceSpec {
    type Err = SourceSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("fs:") {
            if path.is_empty() {
                return Err(SourceSpecError::EmptyPath);
            }
            return Ok(Self::Fs(PathBuf::from(path)));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Http(s.parse()?));
        }
        Err(SourceSpecError::Unknown(s.to_string()))
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fs(path) => write!(f, "fs:{}", path.display()),
            Self::Http(endpoint) => endpoint.fmt(f),
        }
    }
}

/// Build the storage described by `config`.
pub fn assemble(config: &ServerConfig) -> ServerResult<ServedStorage> {
    let upstreams = config.upstream_specs()?;
    let local = config.local.then(|| BlockFs::new(&config.data_dir));
    let backend = fallback(local, sequence(upstreams.iter().map(SourceSpec::open)));
    Ok(Topology::new(backend).cached_if(config.cache).build())
}
