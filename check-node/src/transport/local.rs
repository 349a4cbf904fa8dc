//! In-process transport.
//!
//! Routes calls straight to registered runners. Allows crashing nodes and
//! slowing them down to exercise the coordinator's failure handling.
//!
//! Nodes send through their own [`LocalTransport::endpoint`], so a crashed
//! node is cut off in both directions.

use super::{NodeTransport, TransportError};
use crate::runner::{NodeRunner, RunnerError};
use async_trait::async_trait;
use check_types::{NodeId, NodeStartRequest, NodeStartResponse, NodeState};
use dashmap::{DashMap, DashSet};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// In-process transport.
///
/// Runners are held weakly: dropping the last strong reference to a
/// runner makes its node unreachable, like a process exit would.
#[derive(Debug, Default, Clone)]
pub struct LocalTransport {
    inner: Arc<LocalTransportInner>,
}

#[derive(Debug, Default)]
struct LocalTransportInner {
    runners: DashMap<NodeId, Weak<NodeRunner>>,
    crashed: DashSet<NodeId>,
    latency: DashMap<NodeId, Duration>,
}

impl LocalTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `runner` reachable under its node id.
    pub fn register(&self, runner: &Arc<NodeRunner>) {
        self.inner
            .runners
            .insert(runner.node_id(), Arc::downgrade(runner));
    }

    /// The transport `node` itself sends through.
    ///
    /// While `node` is crashed every call it makes fails as if the target
    /// were unreachable.
    pub fn endpoint(&self, node: NodeId) -> Arc<dyn NodeTransport> {
        Arc::new(LocalEndpoint {
            transport: self.clone(),
            from: node,
        })
    }

    /// Make `node` unreachable until [`restore`](Self::restore) is called.
    pub fn crash(&self, node: NodeId) {
        tracing::info!(node_id = %node, "Crashing node");
        self.inner.crashed.insert(node);
    }

    /// Make a crashed node reachable again.
    pub fn restore(&self, node: NodeId) {
        self.inner.crashed.remove(&node);
    }

    /// Check if `node` was crashed.
    pub fn is_crashed(&self, node: NodeId) -> bool {
        self.inner.crashed.contains(&node)
    }

    /// Delay every call addressed to `node` by `delay`.
    pub fn set_latency(&self, node: NodeId, delay: Duration) {
        self.inner.latency.insert(node, delay);
    }

    /// Remove an injected delay.
    pub fn clear_latency(&self, node: NodeId) {
        self.inner.latency.remove(&node);
    }

    async fn runner(&self, node: NodeId) -> Result<Arc<NodeRunner>, TransportError> {
        let delay = self.inner.latency.get(&node).map(|d| *d.value());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.is_crashed(node) {
            return Err(TransportError::Unreachable(node));
        }

        self.inner
            .runners
            .get(&node)
            .and_then(|weak| weak.upgrade())
            .ok_or(TransportError::Unreachable(node))
    }
}

#[async_trait]
impl NodeTransport for LocalTransport {
    async fn start(
        &self,
        node: NodeId,
        request: NodeStartRequest,
    ) -> Result<NodeStartResponse, TransportError> {
        let runner = self.runner(node).await?;
        match runner.start(request).await {
            Ok(_) => Ok(NodeStartResponse::Accepted),
            Err(RunnerError::Busy { run_id }) => Ok(NodeStartResponse::Busy { run_id }),
            Err(e) => Err(TransportError::Remote {
                node,
                reason: e.to_string(),
            }),
        }
    }

    async fn status(&self, node: NodeId) -> Result<NodeState, TransportError> {
        let runner = self.runner(node).await?;
        Ok(runner.status().await)
    }

    async fn stop(&self, node: NodeId) -> Result<(), TransportError> {
        let runner = self.runner(node).await?;
        runner.stop().await.map_err(|e| TransportError::Remote {
            node,
            reason: e.to_string(),
        })
    }

    async fn netcheck(&self, node: NodeId, payload: &[u8]) -> Result<u64, TransportError> {
        let runner = self.runner(node).await?;
        Ok(runner.handle_netcheck(payload))
    }
}

/// One node's view of a [`LocalTransport`].
#[derive(Debug)]
struct LocalEndpoint {
    transport: LocalTransport,
    from: NodeId,
}

impl LocalEndpoint {
    fn check_alive(&self, to: NodeId) -> Result<(), TransportError> {
        if self.transport.is_crashed(self.from) {
            return Err(TransportError::Unreachable(to));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeTransport for LocalEndpoint {
    async fn start(
        &self,
        node: NodeId,
        request: NodeStartRequest,
    ) -> Result<NodeStartResponse, TransportError> {
        self.check_alive(node)?;
        self.transport.start(node, request).await
    }

    async fn status(&self, node: NodeId) -> Result<NodeState, TransportError> {
        self.check_alive(node)?;
        self.transport.status(node).await
    }

    async fn stop(&self, node: NodeId) -> Result<(), TransportError> {
        self.check_alive(node)?;
        self.transport.stop(node).await
    }

    async fn netcheck(&self, node: NodeId, payload: &[u8]) -> Result<u64, TransportError> {
        self.check_alive(node)?;
        self.transport.netcheck(node, payload).await
    }
}
