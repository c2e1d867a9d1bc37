use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};
use zenea_store::{BlockContent, BlockStorage, CheckError, FetchError, ListError, PutError};
use zenea_types::{Block, BlockId};

use crate::endpoint::{endpoints, RemoteEndpoint};

/// Block storage served by a remote Zenea server.
///
/// Nothing the server says is trusted: fetched content is re-hashed against
/// the requested identifier, and the identifier returned by a put must match
/// the hash of the content that was sent.
#[derive(Clone, Debug)]
pub struct HttpBlockStorage {
    endpoint: RemoteEndpoint,
    client: Client,
}

impl HttpBlockStorage {
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self::with_client(endpoint, Client::new())
    }

    /// Share an existing connection pool.
    pub fn with_client(endpoint: RemoteEndpoint, client: Client) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    fn block_url(&self, id: &BlockId) -> String {
        self.endpoint.url(&format!("{}/{id}", endpoints::BLOCK))
    }
}

/// Read a response body, giving up once it exceeds `limit` bytes.
async fn read_body(mut response: Response, limit: usize) -> Option<Bytes> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return None;
    }
    let mut buf = BytesMut::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if buf.len() + chunk.len() > limit {
                    return None;
                }
                buf.extend_from_slice(&chunk);
            }
            Ok(None) => return Some(buf.freeze()),
            Err(err) => {
                debug!(error = %err, "response body interrupted");
                return None;
            }
        }
    }
}

#[async_trait]
impl BlockStorage for HttpBlockStorage {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        let response = self
            .client
            .get(self.endpoint.url(endpoints::BLOCKS))
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, error = %err, "list request failed");
                ListError::Unable
            })?;
        if response.status() != StatusCode::OK {
            debug!(endpoint = %self.endpoint, status = %response.status(), "list refused");
            return Err(ListError::Unable);
        }
        let body = response.text().await.map_err(|_| ListError::Unable)?;

        Ok(body
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| match s.parse::<BlockId>() {
                Ok(id) => Some(id),
                Err(err) => {
                    debug!(value = s, error = %err, "skipping unparseable id in listing");
                    None
                }
            })
            .collect())
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        let response = self
            .client
            .head(self.block_url(id))
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, error = %err, "check request failed");
                CheckError::Unable
            })?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                debug!(%id, %status, "check refused");
                Err(CheckError::Unable)
            }
        }
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        let response = self
            .client
            .get(self.block_url(id))
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, error = %err, "fetch request failed");
                FetchError::Unable
            })?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
            status => {
                debug!(%id, %status, "fetch refused");
                return Err(FetchError::Unable);
            }
        }

        let Some(content) = read_body(response, Block::MAX_BYTES).await else {
            warn!(%id, endpoint = %self.endpoint, "unreadable or oversize block body");
            return Err(FetchError::InvalidContent);
        };
        let block = Block::with_id(*id, content).map_err(|_| FetchError::InvalidContent)?;
        if !block.matches(id) {
            warn!(%id, endpoint = %self.endpoint, "server returned content not matching id");
            return Err(FetchError::InvalidContent);
        }
        Ok(block)
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        let data = content.read_block_sized().await?;
        let block = Block::new(data).map_err(|_| PutError::Overflow)?;

        let response = self
            .client
            .post(self.endpoint.url(endpoints::BLOCK))
            .body(block.content().clone())
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, error = %err, "put request failed");
                PutError::Unavailable
            })?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::BAD_GATEWAY => return Err(PutError::Unavailable),
            StatusCode::FORBIDDEN => return Err(PutError::NotPermitted),
            status => {
                debug!(%status, "put refused");
                return Err(PutError::Unable);
            }
        }

        let body = response.text().await.map_err(|_| PutError::Unable)?;
        let reported: BlockId = body.trim().parse().map_err(|err| {
            warn!(endpoint = %self.endpoint, error = %err, "server returned unparseable id");
            PutError::Unable
        })?;
        if reported != *block.id() {
            warn!(
                endpoint = %self.endpoint,
                expected = %block.id(),
                %reported,
                "server reported a different id for put content"
            );
            return Err(PutError::Unable);
        }
        Ok(block)
    }
}

impl fmt::Display for HttpBlockStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.endpoint.fmt(f)
    }
}
