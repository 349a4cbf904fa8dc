//! # check-core
//!
//! Pure logic for nodecheck (no I/O, instant tests).
//!
//! This crate implements the state machine and aggregation rules of the
//! self-diagnostics orchestrator without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (probes, peer RPC) is performed by `check-node`, which
//! interprets the actions produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod plan;
pub mod run;
pub mod view;

pub use plan::{validate, PlanError, MAX_REQUEST_SIZE};
pub use run::{RunAction, RunEvent, RunState};
pub use view::{ClusterView, PeerOutcome};
