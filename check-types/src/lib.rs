//! # check-types
//!
//! Wire contract for nodecheck, the distributed self-diagnostics orchestrator.
//!
//! This crate provides the types shared by every nodecheck crate and by
//! external tooling:
//! - [`NodeId`], [`RunId`] - Identity types
//! - [`TestSpec`], [`StartOptions`] - What to run (the Plan)
//! - [`Report`], [`NodeState`], [`NodeReport`] - What came out of it
//! - [`NodeStartRequest`] and friends - Node-to-node RPC messages
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod report;
mod spec;

pub use error::WireError;
pub use ids::{NodeId, RunId};
pub use messages::{NetcheckAck, NodeStartRequest, NodeStartResponse, WireMessage};
pub use report::{
    NodeReport, NodeState, NodeStatus, Report, WARNING_CANCELLED_BEFORE_START,
    WARNING_CANCELLED_RUNNING, WARNING_NO_PEERS,
};
pub use spec::{
    DiskTestSpec, NetworkTestSpec, StartOptions, TestSpec, DEFAULT_DURATION_MS,
    DEFAULT_TEST_NAME,
};
