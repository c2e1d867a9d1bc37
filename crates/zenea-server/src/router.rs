use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use zenea_http::endpoints;
use zenea_store::BlockStorage;

use crate::handler::{self, AppState};

/// Route of a single block, keyed by its textual identifier.
const BLOCK_BY_ID: &str = "/block/:id";

/// Build the axum router exposing `storage` over the block protocol.
pub fn build_router(storage: Arc<dyn BlockStorage>) -> Router {
    Router::new()
        .route(
            BLOCK_BY_ID,
            get(handler::fetch_block).head(handler::check_block),
        )
        .route(endpoints::BLOCK, post(handler::put_block))
        .route(endpoints::BLOCKS, get(handler::list_blocks))
        .fallback(handler::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(storage))
}
