//! Cluster-wide view assembled from independently failing peers.
//!
//! Every status query produces a fresh [`ClusterView`]; nothing is cached
//! between queries because reachability can change on every poll.

use check_types::{NodeId, NodeReport, NodeState, NodeStatus};
use std::collections::BTreeMap;

/// Result of querying one node.
///
/// A failed or timed-out query is a connectivity fact, not a report: it
/// maps to [`NodeState::Unreachable`] and never to a fabricated report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerOutcome {
    /// The node answered with its state.
    Reported(NodeState),
    /// The query failed (connection refused, bad response, ...).
    Failed {
        /// Why the query failed.
        reason: String,
    },
    /// The node did not answer within the per-node timeout.
    TimedOut,
}

impl PeerOutcome {
    /// State to show for this node in the cluster view.
    pub fn into_state(self) -> NodeState {
        match self {
            Self::Reported(state) => state,
            Self::Failed { .. } | Self::TimedOut => NodeState::Unreachable,
        }
    }
}

/// Mapping from node identity to state, ordered by node id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterView {
    nodes: BTreeMap<NodeId, NodeState>,
}

impl ClusterView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view from per-node query outcomes.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = (NodeId, PeerOutcome)>) -> Self {
        outcomes
            .into_iter()
            .map(|(node, outcome)| (node, outcome.into_state()))
            .collect()
    }

    /// Record a node's state, replacing any previous entry.
    pub fn insert(&mut self, node: NodeId, state: NodeState) {
        self.nodes.insert(node, state);
    }

    /// State of one node.
    pub fn get(&self, node: NodeId) -> Option<&NodeState> {
        self.nodes.get(&node)
    }

    /// Number of nodes in the view.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the view has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes with the given status, in id order.
    pub fn nodes_with(&self, status: NodeStatus) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, state)| state.status() == status)
            .map(|(node, _)| *node)
            .collect()
    }

    /// True when no node reports `running`.
    ///
    /// Unreachable nodes are excluded from the determination: a crashed
    /// node must not keep the cluster from settling.
    pub fn is_settled(&self) -> bool {
        !self
            .nodes
            .values()
            .any(|state| state.status() == NodeStatus::Running)
    }

    /// Wire form, ordered by node id.
    pub fn into_reports(self) -> Vec<NodeReport> {
        self.nodes
            .into_iter()
            .map(|(node, state)| state.into_report(node))
            .collect()
    }

    /// Iterate over `(node, state)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeState)> {
        self.nodes.iter()
    }
}

impl FromIterator<(NodeId, NodeState)> for ClusterView {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeState)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
