use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use tracing::debug;
use zenea_http::status;
use zenea_store::{BlockContent, BlockStorage};
use zenea_types::BlockId;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn BlockStorage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn BlockStorage>) -> Self {
        Self { storage }
    }
}

fn parse_id(raw: &str) -> Result<BlockId, Response> {
    raw.parse().map_err(|err| {
        debug!(id = raw, error = %err, "rejecting malformed block id");
        (StatusCode::BAD_REQUEST, format!("invalid block id: {err}")).into_response()
    })
}

/// `GET /block/{id}`
pub async fn fetch_block(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.storage.fetch_block(&id).await {
        Ok(block) => (StatusCode::OK, block.into_content()).into_response(),
        Err(err) => {
            debug!(%id, error = %err, "fetch failed");
            (status::fetch_status(&err), err.to_string()).into_response()
        }
    }
}

/// `HEAD /block/{id}`
pub async fn check_block(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = state.storage.check_block(&id).await;
    status::check_status(&result).into_response()
}

/// `POST /block`
///
/// The request body is streamed into the storage; the storage enforces the
/// size ceiling.
pub async fn put_block(State(state): State<AppState>, body: Body) -> Response {
    let chunks = body.into_data_stream().map_err(io::Error::other);
    let result = state.storage.put_block(BlockContent::new(chunks)).await;
    match status::put_status(&result) {
        (code, Some(block)) => (code, block.id().to_string()).into_response(),
        (code, None) => {
            let message = result.as_ref().err().map(ToString::to_string).unwrap_or_default();
            debug!(%code, error = %message, "put failed");
            (code, message).into_response()
        }
    }
}

/// `GET /blocks`
pub async fn list_blocks(State(state): State<AppState>) -> Response {
    match state.storage.list_blocks().await {
        Ok(ids) => {
            let mut ids: Vec<_> = ids.into_iter().collect();
            ids.sort();
            let body = ids.iter().map(BlockId::to_string).collect::<Vec<_>>().join(",");
            (StatusCode::OK, body).into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

/// Anything outside the block protocol.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "nothing here; see /block/{id} and /blocks")
}
