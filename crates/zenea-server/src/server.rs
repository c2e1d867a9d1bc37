use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use zenea_store::{StorageEither, StorageWrapper};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::topology::{assemble, Backend, ServedStorage};

/// Zenea block server.
pub struct ZeneaServer {
    config: ServerConfig,
    storage: Arc<ServedStorage>,
}

impl ZeneaServer {
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let storage = Arc::new(assemble(&config)?);
        Ok(Self { config, storage })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<ServedStorage> {
        &self.storage
    }

    fn backend(&self) -> &Backend {
        match &*self.storage {
            StorageEither::First(cache) => cache.source(),
            StorageEither::Second(backend) => backend,
        }
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.storage.clone())
    }

    /// Create the local store and load the cache index.
    pub async fn prepare(&self) -> ServerResult<()> {
        if let Some(local) = self.backend().first() {
            local.init().await?;
        }
        if let Some(cache) = self.storage.first() {
            // Upstreams may be down at start; the listing is best-effort.
            if let Err(err) = cache.update_list().await {
                warn!(error = %err, "initial cache index load failed");
            }
        }
        Ok(())
    }

    /// Periodically reload the cache index. Returns `None` without a cache
    /// or with a zero period.
    pub fn spawn_refresh(&self, period: Duration) -> Option<JoinHandle<()>> {
        if period.is_zero() {
            return None;
        }
        self.storage.first()?;
        let storage = Arc::clone(&self.storage);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Some(cache) = storage.first() {
                    if let Err(err) = cache.update_list().await {
                        warn!(error = %err, "cache refresh failed");
                    }
                }
            }
        }))
    }

    /// Start serving requests on the configured address.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener).await
    }

    /// Start serving requests on an already bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> ServerResult<()> {
        self.prepare().await?;
        if let Some(period) = self.config.cache_refresh() {
            self.spawn_refresh(period);
        }

        let addr = listener.local_addr()?;
        info!(%addr, storage = %self.storage, "Zenea server listening");
        axum::serve(listener, self.router())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
