//! Cluster-wide self-test coordination.
//!
//! Any node can coordinate. The coordinator owns no run state: it reads
//! and commands every member's runner through the [`NodeTransport`].

use crate::config::CoordinatorConfig;
use crate::fetcher::PeerStatusFetcher;
use crate::transport::{NodeTransport, TransportError};
use check_core::{validate, PlanError};
use check_types::{
    NodeId, NodeReport, NodeStartRequest, NodeStartResponse, NodeStatus, RunId, StartOptions,
};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Coordinator errors.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A self test is already running on the listed nodes.
    #[error("self test already running on nodes {}", list(.nodes))]
    Busy {
        /// Nodes reporting `running`.
        nodes: Vec<NodeId>,
    },

    /// The start options were rejected before anything was dispatched.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] PlanError),

    /// A reachable node failed to stop.
    #[error("node {node} failed to stop: {reason}")]
    StopFailed {
        /// The node.
        node: NodeId,
        /// What went wrong.
        reason: String,
    },
}

fn list(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of a cluster-wide start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSummary {
    /// Identifier of the new run.
    pub run_id: RunId,
    /// Nodes that accepted the plan.
    pub dispatched: Vec<NodeId>,
    /// Nodes that were already running when the plan arrived.
    pub busy: Vec<NodeId>,
    /// Nodes that could not be reached.
    pub unreachable: Vec<NodeId>,
}

/// Outcome of a cluster-wide stop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StopSummary {
    /// Nodes that confirmed they are idle.
    pub stopped: Vec<NodeId>,
    /// Nodes that could not be reached (and so were not stopped).
    pub unreachable: Vec<NodeId>,
}

/// Fans operator commands out to every member.
pub struct Coordinator {
    node_id: NodeId,
    members: Vec<NodeId>,
    transport: Arc<dyn NodeTransport>,
    fetcher: PeerStatusFetcher,
    config: CoordinatorConfig,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("node_id", &self.node_id)
            .field("members", &self.members)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Create a coordinator running on `node_id` for the given membership.
    pub fn new(
        node_id: NodeId,
        mut members: Vec<NodeId>,
        transport: Arc<dyn NodeTransport>,
        config: CoordinatorConfig,
    ) -> Self {
        members.sort();
        members.dedup();
        let fetcher = PeerStatusFetcher::new(Arc::clone(&transport), config.status_timeout());
        Self {
            node_id,
            members,
            transport,
            fetcher,
            config,
        }
    }

    /// Every known node, sorted.
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Validate `options` and dispatch the plan to every target node.
    ///
    /// Nothing is dispatched when any reachable target is already running.
    /// Unreachable targets are skipped and listed in the summary.
    pub async fn start(&self, options: StartOptions) -> Result<StartSummary, CoordinatorError> {
        let targets = validate(&options, &self.members)?;

        let view = self.fetcher.fetch_view(&targets).await;
        let running = view.nodes_with(NodeStatus::Running);
        if !running.is_empty() {
            tracing::info!(nodes = %list(&running), "Start rejected: self test in progress");
            return Err(CoordinatorError::Busy { nodes: running });
        }

        let mut unreachable = view.nodes_with(NodeStatus::Unreachable);
        let reachable: Vec<NodeId> = targets
            .iter()
            .copied()
            .filter(|node| !unreachable.contains(node))
            .collect();

        let run_id = RunId::new();
        tracing::info!(
            coordinator = %self.node_id,
            %run_id,
            tests = options.tests.len(),
            targets = %list(&targets),
            "Dispatching self test"
        );

        let request = NodeStartRequest {
            run_id,
            tests: options.tests,
            peers: targets,
        };
        let outcomes = join_all(reachable.iter().map(|&node| {
            let request = request.clone();
            async move {
                let result =
                    tokio::time::timeout(self.config.dispatch_timeout(), self.transport.start(node, request))
                        .await
                        .unwrap_or(Err(TransportError::Timeout(node)));
                (node, result)
            }
        }))
        .await;

        let mut dispatched = Vec::new();
        let mut busy = Vec::new();
        for (node, outcome) in outcomes {
            match outcome {
                Ok(NodeStartResponse::Accepted) => dispatched.push(node),
                Ok(NodeStartResponse::Busy { run_id: current }) => {
                    tracing::info!(node_id = %node, %current, "Node busy at dispatch");
                    busy.push(node);
                }
                Err(e) => {
                    tracing::warn!(node_id = %node, error = %e, "Dispatch failed");
                    unreachable.push(node);
                }
            }
        }
        unreachable.sort();

        if dispatched.is_empty() && !busy.is_empty() {
            return Err(CoordinatorError::Busy { nodes: busy });
        }

        Ok(StartSummary {
            run_id,
            dispatched,
            busy,
            unreachable,
        })
    }

    /// Snapshot every member, ordered by node id.
    pub async fn status(&self) -> Vec<NodeReport> {
        self.fetcher.fetch_view(&self.members).await.into_reports()
    }

    /// Stop every reachable member and wait until each is idle.
    pub async fn stop(&self) -> Result<StopSummary, CoordinatorError> {
        tracing::info!(coordinator = %self.node_id, "Stopping self test");

        let stop_timeout = self.config.stop_timeout();
        let outcomes = join_all(self.members.iter().map(|&node| async move {
            // Not idle in time is a failure to stop, not unreachability.
            let result = tokio::time::timeout(stop_timeout, self.transport.stop(node))
                .await
                .unwrap_or_else(|_| {
                    Err(TransportError::Remote {
                        node,
                        reason: format!("not idle after {}ms", stop_timeout.as_millis()),
                    })
                });
            (node, result)
        }))
        .await;

        let mut summary = StopSummary::default();
        let mut failure = None;
        for (node, outcome) in outcomes {
            match outcome {
                Ok(()) => summary.stopped.push(node),
                Err(e) if e.is_connectivity() => {
                    tracing::warn!(node_id = %node, error = %e, "Node not stopped: unreachable");
                    summary.unreachable.push(node);
                }
                Err(e) => {
                    tracing::error!(node_id = %node, error = %e, "Node failed to stop");
                    failure.get_or_insert(CoordinatorError::StopFailed {
                        node,
                        reason: e.to_string(),
                    });
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}
