//! Node-to-node RPC messages.
//!
//! The coordinator on one node drives the runners on every node through
//! these messages. They travel as MessagePack with named fields so that
//! optional and defaulted fields survive the round trip.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{NodeId, NodeState, RunId, TestSpec, WireError};

/// MessagePack encoding shared by all internal messages.
pub trait WireMessage: Serialize + DeserializeOwned {
    /// Serialize to MessagePack bytes.
    fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec_named(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)
    }
}

/// Ask a node's runner to begin a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStartRequest {
    /// Run this plan belongs to
    pub run_id: RunId,
    /// Tests assigned to this node, in order
    pub tests: Vec<TestSpec>,
    /// Every node participating in the run (network probes target these)
    pub peers: Vec<NodeId>,
}

/// Answer to a [`NodeStartRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum NodeStartResponse {
    /// The run was accepted and is now executing
    Accepted,
    /// A run is already in progress; nothing changed
    Busy {
        /// The run that is in progress
        run_id: RunId,
    },
}

/// Answer to a netcheck request: how many payload bytes the peer received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetcheckAck {
    /// Bytes received
    pub received: u64,
}

impl WireMessage for NodeStartRequest {}
impl WireMessage for NodeStartResponse {}
impl WireMessage for NetcheckAck {}
impl WireMessage for NodeState {}
