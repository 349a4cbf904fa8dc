//! Local cluster harness.
//!
//! Builds N nodes sharing one [`LocalTransport`] and gives scenarios the
//! operator's view of the cluster through node 0's coordinator.

use check_node::config::PeerConfig;
use check_node::{CheckNode, Config, Coordinator, CoordinatorError, LocalTransport};
use check_types::{NodeId, NodeReport, NodeStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that can occur while driving a local cluster.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The cluster did not settle in time.
    #[error("cluster did not settle within {waited:?}; last view: {last:?}")]
    NotSettled {
        /// How long we waited.
        waited: Duration,
        /// The last view observed.
        last: Vec<NodeReport>,
    },

    /// A coordinator call failed.
    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// Scratch directory setup failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An in-process nodecheck cluster.
pub struct LocalCluster {
    transport: LocalTransport,
    nodes: Vec<Arc<CheckNode>>,
    _scratch: tempfile::TempDir,
}

impl LocalCluster {
    /// Start a cluster of `size` nodes with test-friendly timeouts.
    pub fn new(size: u32) -> Result<Self, HarnessError> {
        Self::with_config(size, |_| {})
    }

    /// Start a cluster of `size` nodes, letting `tweak` adjust each node's config.
    pub fn with_config(size: u32, tweak: impl Fn(&mut Config)) -> Result<Self, HarnessError> {
        let scratch = tempfile::tempdir()?;
        let transport = LocalTransport::new();

        let peers: Vec<PeerConfig> = (0..size)
            .map(|id| PeerConfig {
                node_id: NodeId::new(id),
                address: format!("local:{id}"),
            })
            .collect();

        let mut nodes = Vec::with_capacity(size as usize);
        for id in 0..size {
            let dir = scratch.path().join(format!("node-{id}"));
            std::fs::create_dir_all(&dir)?;

            let mut config = Config::default();
            config.node.node_id = NodeId::new(id);
            config.cluster.peers = peers.clone();
            config.coordinator.status_timeout_ms = 300;
            config.probes.scratch_dir = dir;
            config.probes.rpc_timeout_ms = 300;
            tweak(&mut config);

            let node = CheckNode::new(config, transport.endpoint(NodeId::new(id)));
            transport.register(node.runner());
            nodes.push(node);
        }

        tracing::debug!(size, "Local cluster started");
        Ok(Self {
            transport,
            nodes,
            _scratch: scratch,
        })
    }

    /// The shared transport, for fault injection.
    pub fn transport(&self) -> &LocalTransport {
        &self.transport
    }

    /// Node `id`.
    pub fn node(&self, id: u32) -> &Arc<CheckNode> {
        &self.nodes[id as usize]
    }

    /// The coordinator scenarios act through (node 0's).
    pub fn coordinator(&self) -> &Coordinator {
        self.nodes[0].coordinator()
    }

    /// Make node `id` unreachable.
    pub fn crash(&self, id: u32) {
        self.transport.crash(NodeId::new(id));
    }

    /// Make node `id` reachable again.
    pub fn restore(&self, id: u32) {
        self.transport.restore(NodeId::new(id));
    }

    /// Poll status until no node reports `running`.
    ///
    /// Unreachable nodes do not hold up settlement.
    pub async fn wait_for_settled(&self, timeout: Duration) -> Result<Vec<NodeReport>, HarnessError> {
        let started = Instant::now();
        loop {
            let view = self.coordinator().status().await;
            if view.iter().all(|r| r.status != NodeStatus::Running) {
                return Ok(view);
            }
            if started.elapsed() >= timeout {
                return Err(HarnessError::NotSettled {
                    waited: timeout,
                    last: view,
                });
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl std::fmt::Debug for LocalCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCluster")
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_cluster_is_idle_without_results() {
        let cluster = LocalCluster::new(3).unwrap();
        let view = cluster.wait_for_settled(Duration::from_secs(1)).await.unwrap();

        assert_eq!(view.len(), 3);
        for (i, report) in view.iter().enumerate() {
            assert_eq!(report.node_id, NodeId::new(i as u32));
            assert_eq!(report.status, NodeStatus::Idle);
            assert!(report.results.is_none());
        }
    }

    #[tokio::test]
    async fn crashed_node_shows_unreachable() {
        let cluster = LocalCluster::new(2).unwrap();
        cluster.crash(1);

        let view = cluster.coordinator().status().await;
        assert_eq!(view[1].status, NodeStatus::Unreachable);

        cluster.restore(1);
        let view = cluster.coordinator().status().await;
        assert_eq!(view[1].status, NodeStatus::Idle);
    }
}
