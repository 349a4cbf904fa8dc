//! HTTP endpoints for nodecheck.
//!
//! Every node serves three groups of routes:
//! - `/v1/debug/self_test/*`: operator API (JSON), coordinating the cluster
//! - `/internal/self_test/*`: node-local RPC used by peers (MessagePack)
//! - `/health`, `/metrics`: operational endpoints

mod admin;
pub mod health;
mod internal;
mod metrics;

use crate::server::CheckNode;
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

pub use health::HealthStatus;

/// Largest request body accepted, sized for network probe payloads.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

const _: () = assert!(check_core::MAX_REQUEST_SIZE as usize <= MAX_BODY_BYTES);

/// Build the HTTP router with all endpoints.
pub fn build_router(node: Arc<CheckNode>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/v1/debug/self_test/start", post(admin::start_handler))
        .route("/v1/debug/self_test/status", get(admin::status_handler))
        .route("/v1/debug/self_test/stop", post(admin::stop_handler))
        .route("/internal/self_test/start", post(internal::start_handler))
        .route("/internal/self_test/status", get(internal::status_handler))
        .route("/internal/self_test/stop", post(internal::stop_handler))
        .route("/internal/self_test/netcheck", post(internal::netcheck_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(Extension(node))
}
