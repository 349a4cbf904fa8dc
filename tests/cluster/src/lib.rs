//! # cluster-tests
//!
//! End-to-end scenarios for nodecheck.
//!
//! Every scenario runs a whole cluster inside one process: each node is a
//! real [`check_node::CheckNode`] and nodes talk through
//! [`check_node::LocalTransport`], which can crash nodes and inject latency.
//!
//! - `harness` - builds and drives a local cluster
//! - `assertions` - pure checks over the cluster view
//! - `scenarios` - the scenarios themselves

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assertions;
pub mod harness;

pub mod scenarios;
