//! Per-node run state machine for nodecheck.
//!
//! This module provides a pure, side-effect-free state machine for one
//! node's self-test lifecycle. The state machine takes events as input and
//! produces a new state plus a list of actions to execute.
//!
//! Executing probes, waiting for them and cancelling them is performed by
//! the node runner in `check-node`, not by this module.

use check_types::{NodeState, Report, RunId};

/// Run state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// No run in progress.
    Idle {
        /// Reports of the last settled run, `None` if no run ever settled.
        results: Option<Vec<Report>>,
    },
    /// A run is in progress.
    Running {
        /// Run being executed.
        run_id: RunId,
        /// Number of tests in the plan.
        expected: usize,
        /// Reports settled so far, in plan order.
        reports: Vec<Report>,
    },
}

impl RunState {
    /// Create a new state machine that has never run.
    pub fn new() -> Self {
        Self::Idle { results: None }
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (node runner)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: RunEvent) -> (Self, Vec<RunAction>) {
        match (self, event) {
            // From Idle
            (Self::Idle { .. }, RunEvent::StartRequested { run_id, tests: 0 }) => (
                Self::Idle {
                    results: Some(Vec::new()),
                },
                vec![
                    RunAction::BeginRun { run_id },
                    RunAction::RunSettled { run_id, reports: 0 },
                ],
            ),
            (Self::Idle { .. }, RunEvent::StartRequested { run_id, tests }) => (
                Self::Running {
                    run_id,
                    expected: tests,
                    reports: Vec::with_capacity(tests),
                },
                vec![RunAction::BeginRun { run_id }],
            ),
            (state @ Self::Idle { .. }, RunEvent::StopRequested) => (state, vec![]),

            // From Running
            (
                Self::Running {
                    run_id,
                    expected,
                    reports,
                },
                RunEvent::StartRequested { .. },
            ) => (
                Self::Running {
                    run_id,
                    expected,
                    reports,
                },
                vec![RunAction::RejectBusy { run_id }],
            ),
            (
                Self::Running {
                    run_id,
                    expected,
                    mut reports,
                },
                RunEvent::ProbeSettled {
                    run_id: settled_run,
                    report,
                },
            ) if settled_run == run_id => {
                reports.push(report);
                if reports.len() >= expected {
                    let count = reports.len();
                    (
                        Self::Idle {
                            results: Some(reports),
                        },
                        vec![RunAction::RunSettled {
                            run_id,
                            reports: count,
                        }],
                    )
                } else {
                    (
                        Self::Running {
                            run_id,
                            expected,
                            reports,
                        },
                        vec![],
                    )
                }
            }
            (Self::Running { run_id, expected, reports }, RunEvent::StopRequested) => (
                Self::Running {
                    run_id,
                    expected,
                    reports,
                },
                vec![RunAction::CancelProbes { run_id }],
            ),

            // Stale reports from an older run, or reports while idle
            (state, RunEvent::ProbeSettled { .. }) => (state, vec![]),
        }
    }

    /// Check if a run is in progress.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// The run in progress, if any.
    pub fn run_id(&self) -> Option<RunId> {
        match self {
            Self::Running { run_id, .. } => Some(*run_id),
            Self::Idle { .. } => None,
        }
    }

    /// Consistent snapshot for status queries.
    ///
    /// Partial reports of a running plan are not exposed.
    pub fn snapshot(&self) -> NodeState {
        match self {
            Self::Idle { results } => NodeState::Idle {
                results: results.clone(),
            },
            Self::Running { run_id, .. } => NodeState::Running { run_id: *run_id },
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can occur in a node's run lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A coordinator asked this node to run a plan.
    StartRequested {
        /// Run identifier minted by the coordinator.
        run_id: RunId,
        /// Number of tests in the plan.
        tests: usize,
    },
    /// One test of the plan produced its report.
    ProbeSettled {
        /// Run the report belongs to.
        run_id: RunId,
        /// The report.
        report: Report,
    },
    /// An operator asked to stop.
    StopRequested,
}

/// Actions to be executed by the node runner.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunAction {
    /// Start executing the plan.
    BeginRun {
        /// The accepted run.
        run_id: RunId,
    },
    /// Refuse the start request; the in-flight run is untouched.
    RejectBusy {
        /// The run already in progress.
        run_id: RunId,
    },
    /// Signal cancellation to the running probe and to all pending ones.
    CancelProbes {
        /// The run to cancel.
        run_id: RunId,
    },
    /// Every test has a report; the node is idle again.
    RunSettled {
        /// The run that settled.
        run_id: RunId,
        /// Number of reports produced.
        reports: usize,
    },
}
