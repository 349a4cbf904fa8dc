//! Probes: the runnable units behind each test type.
//!
//! A probe runs until its own budget elapses or its cancellation token
//! fires, whichever comes first. Cancellation is cooperative: probes check
//! the token between fixed-size I/O requests, so a stop is honored within
//! one request's latency regardless of the requested budget.

mod disk;
mod network;

pub use disk::DiskProbe;
pub use network::NetworkProbe;

use crate::transport::NodeTransport;
use async_trait::async_trait;
use check_types::{NodeId, TestSpec};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a probe did not complete its budget.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The cancellation token fired.
    #[error("probe cancelled")]
    Cancelled,

    /// A peer targeted by a network probe could not be reached.
    #[error("Failed to reach peer with node_id: {0}")]
    PeerUnreachable(NodeId),

    /// A peer answered with an error.
    #[error("peer {node} rejected request: {reason}")]
    PeerFailed {
        /// The peer.
        node: NodeId,
        /// What it reported.
        reason: String,
    },

    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A network probe has nobody to talk to.
    #[error("no peers available")]
    NoPeers,
}

/// Counters gathered by a probe, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// Requests completed.
    pub requests: u64,
    /// Bytes moved.
    pub bytes: u64,
}

impl ProbeStats {
    /// Add another worker's counters.
    pub fn merge(mut self, other: ProbeStats) -> Self {
        self.requests += other.requests;
        self.bytes += other.bytes;
        self
    }
}

/// A runnable benchmark unit.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run until the budget elapses or `cancel` fires.
    async fn run(&self, cancel: CancellationToken) -> Result<ProbeStats, ProbeError>;
}

/// Everything a probe needs from the node it runs on.
#[derive(Clone)]
pub struct ProbeContext {
    /// The node running the probe.
    pub node_id: NodeId,
    /// Every node participating in the run (may include `node_id`).
    pub peers: Vec<NodeId>,
    /// Peer RPC.
    pub transport: Arc<dyn NodeTransport>,
    /// Where disk probes create scratch files.
    pub scratch_dir: PathBuf,
    /// Upper bound on per-probe parallelism.
    pub max_parallelism: u16,
    /// Timeout of a single peer request.
    pub rpc_timeout: Duration,
}

impl std::fmt::Debug for ProbeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeContext")
            .field("node_id", &self.node_id)
            .field("peers", &self.peers)
            .field("scratch_dir", &self.scratch_dir)
            .field("max_parallelism", &self.max_parallelism)
            .field("rpc_timeout", &self.rpc_timeout)
            .finish_non_exhaustive()
    }
}

impl ProbeContext {
    /// Clamp a requested parallelism to the node's limit (at least 1).
    pub fn clamp_parallelism(&self, requested: u16) -> usize {
        usize::from(requested.min(self.max_parallelism).max(1))
    }
}

/// Build the probe for a test spec.
pub fn build_probe(spec: &TestSpec, ctx: &ProbeContext) -> Box<dyn Probe> {
    match spec {
        TestSpec::Disk(disk) => Box::new(DiskProbe::new(disk.clone(), ctx)),
        TestSpec::Network(net) => Box::new(NetworkProbe::new(net.clone(), ctx)),
    }
}

/// Wall-clock budget shared by a probe's workers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    deadline: Instant,
}

impl Budget {
    pub(crate) fn from_millis(ms: u64) -> Self {
        Self {
            deadline: Instant::now() + Duration::from_millis(ms),
        }
    }

    pub(crate) fn exhausted(&self) -> bool {
        Instant::now() >= self.deadline
    }
}
