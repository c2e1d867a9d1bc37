use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zenea_http::DEFAULT_PORT;

use crate::error::{ServerError, ServerResult};
use crate::topology::SourceSpec;

/// Server configuration, usually loaded from a TOML file.
///
/// Every key is optional; missing keys take their [`Default`] value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Base path of the local filesystem store.
    pub data_dir: PathBuf,
    /// Serve from a local filesystem store. Without it the server is a pure
    /// proxy for its upstreams.
    pub local: bool,
    /// Fallback sources consulted after the local store, in order.
    pub upstreams: Vec<String>,
    pub cache: bool,
    pub cache_refresh_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            data_dir: PathBuf::from("zenea-data"),
            local: true,
            upstreams: Vec::new(),
            cache: true,
            cache_refresh_secs: None,
        }
    }
}

impl ServerConfig {
    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse every upstream, rejecting a configuration that serves nothing.
    pub fn upstream_specs(&self) -> ServerResult<Vec<SourceSpec>> {
        let specs = self
            .upstreams
            .iter()
            .map(|s| s.parse::<SourceSpec>())
            .collect::<Result<Vec<_>, _>>()?;
        if !self.local && specs.is_empty() {
            return Err(ServerError::Config(
                "no local store and no upstreams configured".into(),
            ));
        }
        Ok(specs)
    }

    pub fn cache_refresh(&self) -> Option<Duration> {
        self.cache_refresh_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}
