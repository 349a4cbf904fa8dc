//! Declarative test plan: what an operator asks every node to run.
//!
//! A [`StartOptions`] is the body of a `start` request. It carries an ordered
//! list of [`TestSpec`]s and an optional subset of target nodes.

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Default budget for a single test.
pub const DEFAULT_DURATION_MS: u64 = 5000;

/// Default operator label when a test is submitted without a name.
pub const DEFAULT_TEST_NAME: &str = "unnamed";

/// One probe to run, tagged on the wire by `"type": "disk" | "network"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TestSpec {
    /// Local disk throughput/latency probe
    Disk(DiskTestSpec),
    /// Node-to-node network probe
    Network(NetworkTestSpec),
}

impl TestSpec {
    /// Operator label (non-unique).
    pub fn name(&self) -> &str {
        match self {
            Self::Disk(d) => &d.name,
            Self::Network(n) => &n.name,
        }
    }

    /// Wall-clock budget in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        match self {
            Self::Disk(d) => d.duration_ms,
            Self::Network(n) => n.duration_ms,
        }
    }

    /// Short type label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disk(_) => "disk",
            Self::Network(_) => "network",
        }
    }
}

/// Parameters of a disk probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskTestSpec {
    /// Operator label
    #[serde(default = "default_name")]
    pub name: String,
    /// Target wall-clock budget
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Skip the read pass
    #[serde(default)]
    pub skip_read: bool,
    /// Skip the write pass
    #[serde(default)]
    pub skip_write: bool,
    /// Flush every write to stable storage
    #[serde(default = "default_dsync")]
    pub dsync: bool,
    /// Size of the scratch file in bytes
    #[serde(default = "default_disk_data_size")]
    pub data_size: u64,
    /// Size of each I/O request in bytes
    #[serde(default = "default_disk_request_size")]
    pub request_size: u64,
    /// Number of concurrent I/O workers
    #[serde(default = "default_parallelism")]
    pub parallelism: u16,
}

impl Default for DiskTestSpec {
    fn default() -> Self {
        Self {
            name: default_name(),
            duration_ms: default_duration_ms(),
            skip_read: false,
            skip_write: false,
            dsync: default_dsync(),
            data_size: default_disk_data_size(),
            request_size: default_disk_request_size(),
            parallelism: default_parallelism(),
        }
    }
}

/// Parameters of a network probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTestSpec {
    /// Operator label
    #[serde(default = "default_name")]
    pub name: String,
    /// Target wall-clock budget
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Payload size of each request in bytes
    #[serde(default = "default_network_request_size")]
    pub request_size: u64,
    /// Number of concurrent requests per peer
    #[serde(default = "default_parallelism")]
    pub parallelism: u16,
}

impl Default for NetworkTestSpec {
    fn default() -> Self {
        Self {
            name: default_name(),
            duration_ms: default_duration_ms(),
            request_size: default_network_request_size(),
            parallelism: default_parallelism(),
        }
    }
}

/// Body of a cluster-wide `start` request (the Plan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOptions {
    /// Tests to run, in order
    pub tests: Vec<TestSpec>,
    /// Target subset; `None` means every node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeId>>,
}

// Default value functions
fn default_name() -> String {
    DEFAULT_TEST_NAME.to_string()
}

fn default_duration_ms() -> u64 {
    DEFAULT_DURATION_MS
}

fn default_dsync() -> bool {
    true
}

fn default_disk_data_size() -> u64 {
    1024 * 1024 * 1024 // 1 GiB
}

fn default_disk_request_size() -> u64 {
    512 * 1024 // 512 KiB
}

fn default_network_request_size() -> u64 {
    128 * 1024 // 128 KiB
}

fn default_parallelism() -> u16 {
    10
}
