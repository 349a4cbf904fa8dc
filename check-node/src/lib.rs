//! # check-node
//!
//! Node daemon for nodecheck, the distributed self-diagnostics orchestrator.
//!
//! Every node in the cluster runs this daemon. It:
//! - Executes self-test plans locally (disk and network probes)
//! - Answers peers' network probes
//! - Coordinates cluster-wide start, status and stop on operator request
//!
//! ## Architecture
//!
//! ```text
//!  operator ──HTTP/JSON──► any node
//!                           │ Coordinator
//!                           │   fan-out over NodeTransport
//!            ┌──────────────┼──────────────┐
//!            ▼              ▼              ▼
//!        NodeRunner     NodeRunner     NodeRunner
//!        (node 0)       (node 1)       (node 2)
//!            │  probes: disk I/O, netcheck to peers
//! ```
//!
//! The run state machine itself lives in `check-core`; this crate
//! executes the actions it produces.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod probe;
pub mod runner;
pub mod server;
pub mod transport;

pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorError, StartSummary, StopSummary};
pub use error::{NodeError, Result};
pub use runner::{NodeRunner, RunnerError, RunnerMetrics};
pub use server::CheckNode;
pub use transport::{HttpTransport, LocalTransport, NodeTransport, TransportError};
