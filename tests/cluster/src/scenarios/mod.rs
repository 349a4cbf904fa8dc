//! Cluster scenarios.
//!
//! - `run` - clean runs, node subsets, status idempotence
//! - `stop` - synchronous stop and busy rejection
//! - `failure` - crashed and slow nodes

pub mod failure;
pub mod run;
pub mod stop;

use check_types::{DiskTestSpec, NetworkTestSpec, NodeId, StartOptions, TestSpec};

/// A small disk test that finishes in about `duration_ms`.
pub fn disk(duration_ms: u64) -> TestSpec {
    TestSpec::Disk(DiskTestSpec {
        name: "disk".into(),
        duration_ms,
        dsync: false,
        data_size: 256 * 1024,
        request_size: 4096,
        parallelism: 4,
        ..DiskTestSpec::default()
    })
}

/// A small network test that finishes in about `duration_ms`.
pub fn network(duration_ms: u64) -> TestSpec {
    TestSpec::Network(NetworkTestSpec {
        name: "network".into(),
        duration_ms,
        request_size: 4096,
        parallelism: 2,
    })
}

/// Start options for `tests` on every node, or on `nodes` when given.
pub fn plan(tests: Vec<TestSpec>, nodes: Option<&[u32]>) -> StartOptions {
    StartOptions {
        tests,
        nodes: nodes.map(|ids| ids.iter().copied().map(NodeId::new).collect()),
    }
}
