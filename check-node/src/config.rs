//! Configuration loading for nodecheckd.
//!
//! Configuration is loaded from a TOML file (default: `nodecheck.toml`).

use check_types::NodeId;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for nodecheckd.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// This node's identity and listener.
    #[serde(default)]
    pub node: NodeConfig,
    /// Resolved cluster membership.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Coordinator fan-out timeouts.
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    /// Probe execution limits.
    #[serde(default)]
    pub probes: ProbeConfig,
}

/// Node identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// This node's id (default: 0).
    #[serde(default)]
    pub node_id: NodeId,
    /// Bind address for the admin and internal HTTP endpoints (default: 0.0.0.0:9644).
    #[serde(default = "default_admin_bind")]
    pub admin_bind: String,
}

/// Cluster membership, handed to us fully resolved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterConfig {
    /// Every peer with the address of its HTTP endpoints.
    /// The local node may be listed; it is added implicitly otherwise.
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

/// One cluster member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerConfig {
    /// Member id.
    pub node_id: NodeId,
    /// `host:port` of the member's HTTP endpoints.
    pub address: String,
}

/// Coordinator timeouts.
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    /// Per-node timeout for status queries in milliseconds (default: 2000).
    #[serde(default = "default_status_timeout_ms")]
    pub status_timeout_ms: u64,
    /// Per-node timeout for dispatching a plan in milliseconds (default: 5000).
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,
    /// Per-node timeout for a synchronous stop in milliseconds (default: 30000).
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

/// Probe limits.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Directory for disk probe scratch files (default: system temp dir).
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Upper bound on a probe's `parallelism` (default: 64).
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: u16,
    /// Timeout of a single network probe request in milliseconds (default: 2000).
    /// A dead peer fails the probe after this long instead of hanging it.
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
}

// Default value functions
fn default_admin_bind() -> String {
    "0.0.0.0:9644".to_string()
}

fn default_status_timeout_ms() -> u64 {
    2000
}

fn default_dispatch_timeout_ms() -> u64 {
    5000
}

fn default_stop_timeout_ms() -> u64 {
    30_000
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_max_parallelism() -> u16 {
    64
}

fn default_rpc_timeout_ms() -> u64 {
    2000
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: NodeId::default(),
            admin_bind: default_admin_bind(),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            status_timeout_ms: default_status_timeout_ms(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            max_parallelism: default_max_parallelism(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            cluster: ClusterConfig::default(),
            coordinator: CoordinatorConfig::default(),
            probes: ProbeConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Status timeout as a Duration.
    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    /// Dispatch timeout as a Duration.
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    /// Stop timeout as a Duration.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl ProbeConfig {
    /// Per-request timeout as a Duration.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for peer in &self.cluster.peers {
            if !seen.insert(peer.node_id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate peer node_id {}",
                    peer.node_id
                )));
            }
        }

        let timeouts = [
            ("coordinator.status_timeout_ms", self.coordinator.status_timeout_ms),
            ("coordinator.dispatch_timeout_ms", self.coordinator.dispatch_timeout_ms),
            ("coordinator.stop_timeout_ms", self.coordinator.stop_timeout_ms),
            ("probes.rpc_timeout_ms", self.probes.rpc_timeout_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
        }

        if self.probes.max_parallelism == 0 {
            return Err(ConfigError::Invalid(
                "probes.max_parallelism must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Every cluster member, including this node, sorted by id.
    pub fn members(&self) -> Vec<NodeId> {
        let mut members: Vec<NodeId> = self.cluster.peers.iter().map(|p| p.node_id).collect();
        if !members.contains(&self.node.node_id) {
            members.push(self.node.node_id);
        }
        members.sort();
        members
    }
}

impl Config {
    /// Address book for peer RPC.
    ///
    /// When this node is not listed among the peers it is reached through
    /// its own admin listener; wildcard binds are dialed on loopback.
    pub fn peer_addresses(&self) -> Vec<PeerConfig> {
        let mut peers = self.cluster.peers.clone();
        if !peers.iter().any(|p| p.node_id == self.node.node_id) {
            peers.push(PeerConfig {
                node_id: self.node.node_id,
                address: loopback(&self.node.admin_bind),
            });
        }
        peers
    }
}

fn loopback(bind: &str) -> String {
    if let Some(port) = bind.strip_prefix("0.0.0.0:") {
        format!("127.0.0.1:{port}")
    } else if let Some(port) = bind.strip_prefix("[::]:") {
        format!("[::1]:{port}")
    } else {
        bind.to_string()
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Values parsed but do not make sense together.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
