//! Node-to-node transport for nodecheck.
//!
//! The coordinator drives every node's runner through this seam, and the
//! network probe uses it to exchange payloads with peers.
//!
//! # Design
//!
//! The transport trait is async and addressed by [`NodeId`]:
//! - `start()` hands a plan to a node's runner
//! - `status()` snapshots a node's state
//! - `stop()` cancels a node's run and waits until it is idle
//! - `netcheck()` sends a payload to a peer and returns the echoed byte count
//!
//! Two implementations exist: [`LocalTransport`] keeps every runner in one
//! process (tests, demos) and [`HttpTransport`] talks to real peers.

mod http;
mod local;

pub use http::{HttpTransport, MSGPACK_CONTENT_TYPE};
pub use local::LocalTransport;

use async_trait::async_trait;
use check_types::{NodeId, NodeStartRequest, NodeStartResponse, NodeState};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The node could not be reached at all.
    #[error("node {0} is unreachable")]
    Unreachable(NodeId),

    /// The node did not answer in time.
    #[error("node {0} timed out")]
    Timeout(NodeId),

    /// The node answered with a failure.
    #[error("node {node} failed: {reason}")]
    Remote {
        /// Node that failed.
        node: NodeId,
        /// Failure reported by the node.
        reason: String,
    },

    /// A message could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The transport itself could not be set up.
    #[error("transport setup failed: {0}")]
    Setup(String),
}

impl TransportError {
    /// True for failures that mean "could not talk to the node", as
    /// opposed to "the node talked back with an error".
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout(_))
    }
}

/// Transport trait for driving runners on (possibly remote) nodes.
#[async_trait]
pub trait NodeTransport: Send + Sync {
    /// Ask `node` to begin running a plan.
    async fn start(
        &self,
        node: NodeId,
        request: NodeStartRequest,
    ) -> Result<NodeStartResponse, TransportError>;

    /// Snapshot `node`'s state.
    async fn status(&self, node: NodeId) -> Result<NodeState, TransportError>;

    /// Cancel `node`'s run and wait until it is idle.
    async fn stop(&self, node: NodeId) -> Result<(), TransportError>;

    /// Send `payload` to `node`; returns how many bytes it received.
    async fn netcheck(&self, node: NodeId, payload: &[u8]) -> Result<u64, TransportError>;
}
