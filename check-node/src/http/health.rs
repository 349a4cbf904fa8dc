//! Health check endpoint.

use crate::server::CheckNode;
use axum::{Extension, Json};
use check_types::{NodeId, NodeStatus};
use serde::Serialize;
use std::sync::Arc;

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// This node's identity.
    pub node_id: NodeId,
    /// Local run state.
    pub state: NodeStatus,
    /// Number of cluster members known to this node.
    pub members: usize,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Health check handler.
pub async fn health_handler(Extension(node): Extension<Arc<CheckNode>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        node_id: node.node_id(),
        state: node.runner().status().await.status(),
        members: node.coordinator().members().len(),
        uptime_seconds: node.uptime_seconds(),
    })
}
