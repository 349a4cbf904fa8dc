//! Outcome types: per-test [`Report`]s and per-node state.

use serde::{Deserialize, Serialize};

use crate::{NodeId, RunId, WireError};

/// Warning attached to the test that was running when a stop arrived.
pub const WARNING_CANCELLED_RUNNING: &str = "Test was cancelled while running";

/// Warning attached to tests that never started because of a stop.
pub const WARNING_CANCELLED_BEFORE_START: &str = "Test was cancelled before it started";

/// Warning attached to a network test on a node with no one to talk to.
pub const WARNING_NO_PEERS: &str = "Network test skipped: no peers available";

/// Outcome of one test on one node.
///
/// Exactly one of clean success, `error` or `warning` holds. The
/// constructors are the only way to build a report, and deserialization
/// rejects payloads that carry both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReport")]
pub struct Report {
    duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

impl Report {
    /// The test ran to its budget.
    pub fn success(duration_ms: u64) -> Self {
        Self {
            duration: duration_ms,
            error: None,
            warning: None,
        }
    }

    /// The test failed inside the probe.
    pub fn failed(duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            duration: duration_ms,
            error: Some(error.into()),
            warning: None,
        }
    }

    /// The test was stopped before completing naturally.
    pub fn cancelled(duration_ms: u64, warning: impl Into<String>) -> Self {
        Self {
            duration: duration_ms,
            error: None,
            warning: Some(warning.into()),
        }
    }

    /// The run was stopped before this test began.
    pub fn not_started() -> Self {
        Self::cancelled(0, WARNING_CANCELLED_BEFORE_START)
    }

    /// Elapsed milliseconds.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Probe failure, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Cancellation warning, if any.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// True when neither error nor warning is set.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.warning.is_none()
    }
}

#[derive(Deserialize)]
struct RawReport {
    duration: u64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warning: Option<String>,
}

impl TryFrom<RawReport> for Report {
    type Error = WireError;

    fn try_from(raw: RawReport) -> Result<Self, Self::Error> {
        if raw.error.is_some() && raw.warning.is_some() {
            return Err(WireError::ConflictingOutcome);
        }
        Ok(Self {
            duration: raw.duration,
            error: raw.error,
            warning: raw.warning,
        })
    }
}

/// Coarse node status as shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// No run in progress
    Idle,
    /// A run is in progress
    Running,
    /// The node did not answer
    Unreachable,
}

impl NodeStatus {
    /// Lowercase label, identical to the wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Unreachable => "unreachable",
        }
    }
}

/// Full per-node state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NodeState {
    /// Not running; holds the last settled run's reports, if any run ever settled.
    Idle {
        /// One report per test of the last run, in plan order
        results: Option<Vec<Report>>,
    },
    /// A run is in progress.
    Running {
        /// The run being executed
        run_id: RunId,
    },
    /// The node could not be reached; carries no reports.
    Unreachable,
}

impl NodeState {
    /// Coarse status of this state.
    pub fn status(&self) -> NodeStatus {
        match self {
            Self::Idle { .. } => NodeStatus::Idle,
            Self::Running { .. } => NodeStatus::Running,
            Self::Unreachable => NodeStatus::Unreachable,
        }
    }

    /// Reports of the last settled run, only while idle.
    pub fn results(&self) -> Option<&[Report]> {
        match self {
            Self::Idle { results } => results.as_deref(),
            _ => None,
        }
    }

    /// Project into the operator-facing entry for `node_id`.
    pub fn into_report(self, node_id: NodeId) -> NodeReport {
        let status = self.status();
        let results = match self {
            Self::Idle { results } => results,
            _ => None,
        };
        NodeReport {
            node_id,
            status,
            results,
        }
    }
}

/// One entry of the cluster view as returned by `status`.
///
/// `results` is present iff the node is idle and a run has settled at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    /// Node this entry describes
    pub node_id: NodeId,
    /// Coarse status
    pub status: NodeStatus,
    /// Reports of the last settled run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Report>>,
}
