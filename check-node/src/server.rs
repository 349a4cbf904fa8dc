//! Node daemon assembly.
//!
//! A [`CheckNode`] bundles this node's runner with a coordinator that can
//! drive the whole cluster, and serves both over HTTP.

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::http::build_router;
use crate::runner::NodeRunner;
use crate::transport::{HttpTransport, NodeTransport};
use check_types::NodeId;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// One nodecheck node.
pub struct CheckNode {
    config: Config,
    runner: Arc<NodeRunner>,
    coordinator: Coordinator,
    started_at: Instant,
}

impl std::fmt::Debug for CheckNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckNode")
            .field("config", &self.config)
            .field("runner", &self.runner)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl CheckNode {
    /// Create a node that reaches its peers through `transport`.
    pub fn new(config: Config, transport: Arc<dyn NodeTransport>) -> Arc<Self> {
        let runner = NodeRunner::new(
            config.node.node_id,
            Arc::clone(&transport),
            config.probes.clone(),
        );
        let coordinator = Coordinator::new(
            config.node.node_id,
            config.members(),
            transport,
            config.coordinator.clone(),
        );

        Arc::new(Self {
            config,
            runner,
            coordinator,
            started_at: Instant::now(),
        })
    }

    /// Create a node that talks to its peers over HTTP.
    pub fn with_http_transport(config: Config) -> Result<Arc<Self>> {
        let transport = HttpTransport::new(&config.peer_addresses(), config.probes.rpc_timeout())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// This node's identity.
    pub fn node_id(&self) -> NodeId {
        self.config.node.node_id
    }

    /// Get the node configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// This node's runner.
    pub fn runner(&self) -> &Arc<NodeRunner> {
        &self.runner
    }

    /// The cluster coordinator hosted by this node.
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Seconds since this node was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Serve the admin and internal endpoints until `shutdown` resolves.
    ///
    /// A run in progress is stopped before returning.
    pub async fn serve(self: Arc<Self>, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.node.admin_bind).await?;
        tracing::info!(
            node_id = %self.node_id(),
            addr = %listener.local_addr()?,
            members = self.coordinator.members().len(),
            "nodecheck listening"
        );

        axum::serve(listener, build_router(Arc::clone(&self)))
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!(node_id = %self.node_id(), "Shutting down, stopping local run");
        self.runner.stop().await?;
        Ok(())
    }
}
