//! Concurrent status collection from cluster members.

use crate::transport::{NodeTransport, TransportError};
use check_core::{ClusterView, PeerOutcome};
use check_types::NodeId;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Queries node status through the transport, each call bounded by a
/// timeout. A node that fails or times out is reported as unreachable for
/// that call only.
#[derive(Clone)]
pub struct PeerStatusFetcher {
    transport: Arc<dyn NodeTransport>,
    timeout: Duration,
}

impl std::fmt::Debug for PeerStatusFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerStatusFetcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PeerStatusFetcher {
    /// Create a fetcher.
    pub fn new(transport: Arc<dyn NodeTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Query one node.
    pub async fn fetch(&self, node: NodeId) -> PeerOutcome {
        match tokio::time::timeout(self.timeout, self.transport.status(node)).await {
            Ok(Ok(state)) => PeerOutcome::Reported(state),
            Ok(Err(TransportError::Timeout(_))) | Err(_) => {
                tracing::debug!(node_id = %node, "Status query timed out");
                PeerOutcome::TimedOut
            }
            Ok(Err(e)) => {
                tracing::debug!(node_id = %node, error = %e, "Status query failed");
                PeerOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Query every node in `nodes` concurrently.
    pub async fn fetch_view(&self, nodes: &[NodeId]) -> ClusterView {
        let outcomes = join_all(nodes.iter().map(|&node| async move {
            (node, self.fetch(node).await)
        }))
        .await;

        ClusterView::from_outcomes(outcomes)
    }
}
