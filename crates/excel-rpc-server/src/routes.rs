//! Route definitions.

use crate::handlers;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// JSON-RPC and health routes
pub fn rpc_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rpc", post(handlers::rpc))
        .route("/health", get(handlers::health))
}
