//! Per-node run executor.
//!
//! Drives the pure [`RunState`] machine from `check-core` and performs the
//! actions it emits: spawning probes, cancelling them, and flipping the idle
//! signal that `stop` waits on.

use crate::config::ProbeConfig;
use crate::probe::{build_probe, Probe, ProbeContext, ProbeError};
use crate::transport::NodeTransport;
use check_core::{validate, PlanError, RunAction, RunEvent, RunState};
use check_types::{
    NodeId, NodeStartRequest, NodeState, Report, RunId, StartOptions, TestSpec,
    WARNING_CANCELLED_RUNNING, WARNING_NO_PEERS,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

/// Runner errors.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Another run is in progress.
    #[error("node is busy with run {run_id}")]
    Busy {
        /// The run in progress.
        run_id: RunId,
    },

    /// The plan handed to the node is unusable.
    #[error("invalid plan: {0}")]
    InvalidPlan(#[from] PlanError),

    /// The idle signal closed while waiting for a stop.
    #[error("runner is shutting down")]
    Shutdown,
}

/// Operational metrics for one node's runner.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct RunnerMetrics {
    /// Runs accepted.
    pub runs_started: AtomicU64,
    /// Runs that settled with a report per test.
    pub runs_completed: AtomicU64,
    /// Start requests refused because a run was in progress.
    pub runs_rejected: AtomicU64,
    /// Runs cancelled by a stop.
    pub runs_stopped: AtomicU64,
    /// Probes that ran to their budget.
    pub probes_succeeded: AtomicU64,
    /// Probes that ended with an error.
    pub probes_failed: AtomicU64,
    /// Probes cut short or skipped.
    pub probes_cancelled: AtomicU64,
    /// Netcheck payloads received from peers.
    pub netcheck_requests: AtomicU64,
    /// Netcheck bytes received from peers.
    pub netcheck_bytes: AtomicU64,
}

#[derive(Debug, Default)]
struct RunnerInner {
    machine: RunState,
    cancel: Option<CancellationToken>,
}

/// Executes plans on one node, one run at a time.
pub struct NodeRunner {
    node_id: NodeId,
    transport: Arc<dyn NodeTransport>,
    probes: ProbeConfig,
    inner: RwLock<RunnerInner>,
    /// `true` whenever no run is in progress.
    idle: watch::Sender<bool>,
    metrics: RunnerMetrics,
}

impl std::fmt::Debug for NodeRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRunner")
            .field("node_id", &self.node_id)
            .field("probes", &self.probes)
            .field("idle", &*self.idle.borrow())
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl NodeRunner {
    /// Create an idle runner.
    pub fn new(
        node_id: NodeId,
        transport: Arc<dyn NodeTransport>,
        probes: ProbeConfig,
    ) -> Arc<Self> {
        let (idle, _) = watch::channel(true);
        Arc::new(Self {
            node_id,
            transport,
            probes,
            inner: RwLock::new(RunnerInner::default()),
            idle,
            metrics: RunnerMetrics::default(),
        })
    }

    /// The node this runner executes on.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RunnerMetrics {
        &self.metrics
    }

    /// Accept a plan and begin executing it in the background.
    ///
    /// Returns as soon as the run is registered; probes run on a spawned
    /// task. Fails with [`RunnerError::Busy`] if a run is in progress.
    pub async fn start(self: &Arc<Self>, request: NodeStartRequest) -> Result<RunId, RunnerError> {
        let cancel = self.begin(&request).await?;
        let NodeStartRequest {
            run_id,
            tests,
            peers,
        } = request;

        if let Some(cancel) = cancel {
            let ctx = ProbeContext {
                node_id: self.node_id,
                peers,
                transport: Arc::clone(&self.transport),
                scratch_dir: self.probes.scratch_dir.clone(),
                max_parallelism: self.probes.max_parallelism,
                rpc_timeout: self.probes.rpc_timeout(),
            };
            let probes: Vec<Box<dyn Probe>> =
                tests.iter().map(|spec| build_probe(spec, &ctx)).collect();
            let runner = Arc::clone(self);
            tokio::spawn(async move { runner.execute(run_id, tests, probes, cancel).await });
        }
        Ok(run_id)
    }

    /// Register a run with the state machine.
    ///
    /// Returns the run's cancellation token when probes must be executed,
    /// `None` when the run settled on registration.
    async fn begin(
        &self,
        request: &NodeStartRequest,
    ) -> Result<Option<CancellationToken>, RunnerError> {
        let options = StartOptions {
            tests: request.tests.clone(),
            nodes: None,
        };
        validate(&options, &request.peers)?;

        let mut inner = self.inner.write().await;
        let machine = std::mem::take(&mut inner.machine);
        let (machine, actions) = machine.on_event(RunEvent::StartRequested {
            run_id: request.run_id,
            tests: request.tests.len(),
        });
        inner.machine = machine;

        let mut accepted = None;
        for action in actions {
            match action {
                RunAction::RejectBusy { run_id } => {
                    self.metrics.runs_rejected.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(node_id = %self.node_id, %run_id, "Rejected start: busy");
                    return Err(RunnerError::Busy { run_id });
                }
                RunAction::BeginRun { run_id } => {
                    let token = CancellationToken::new();
                    inner.cancel = Some(token.clone());
                    self.idle.send_replace(false);
                    self.metrics.runs_started.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(
                        node_id = %self.node_id,
                        %run_id,
                        tests = request.tests.len(),
                        "Run started"
                    );
                    accepted = Some(token);
                }
                RunAction::RunSettled { .. } => self.mark_settled(&mut inner),
                RunAction::CancelProbes { .. } => {}
            }
        }

        Ok(accepted.filter(|_| inner.machine.is_running()))
    }

    /// Consistent snapshot of this node's state.
    pub async fn status(&self) -> NodeState {
        self.inner.read().await.machine.snapshot()
    }

    /// Cancel the run in progress, if any, and wait until the node is idle.
    ///
    /// Returns immediately when idle.
    pub async fn stop(&self) -> Result<(), RunnerError> {
        {
            let mut inner = self.inner.write().await;
            let machine = std::mem::take(&mut inner.machine);
            let (machine, actions) = machine.on_event(RunEvent::StopRequested);
            inner.machine = machine;

            for action in actions {
                if let RunAction::CancelProbes { run_id } = action {
                    if let Some(token) = &inner.cancel {
                        token.cancel();
                    }
                    self.metrics.runs_stopped.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(node_id = %self.node_id, %run_id, "Stopping run");
                }
            }
        }

        let mut idle = self.idle.subscribe();
        idle.wait_for(|idle| *idle)
            .await
            .map_err(|_| RunnerError::Shutdown)?;
        Ok(())
    }

    /// Answer a peer's network probe; returns the number of bytes received.
    pub fn handle_netcheck(&self, payload: &[u8]) -> u64 {
        let len = payload.len() as u64;
        self.metrics.netcheck_requests.fetch_add(1, Ordering::Relaxed);
        self.metrics.netcheck_bytes.fetch_add(len, Ordering::Relaxed);
        len
    }

    /// Run `probes` in order, one per test, settling a report for each.
    async fn execute(
        &self,
        run_id: RunId,
        tests: Vec<TestSpec>,
        probes: Vec<Box<dyn Probe>>,
        cancel: CancellationToken,
    ) {
        for (index, (spec, probe)) in tests.into_iter().zip(probes).enumerate() {
            let report = if cancel.is_cancelled() {
                self.metrics.probes_cancelled.fetch_add(1, Ordering::Relaxed);
                Report::not_started()
            } else {
                self.run_probe(index, &spec, probe, &cancel).await
            };
            self.settle(run_id, report).await;
        }
    }

    async fn run_probe(
        &self,
        index: usize,
        spec: &TestSpec,
        probe: Box<dyn Probe>,
        cancel: &CancellationToken,
    ) -> Report {
        let token = cancel.clone();
        let started = Instant::now();

        // A panicking probe must still produce a report.
        let outcome = tokio::spawn(async move { probe.run(token).await }).await;
        let elapsed = elapsed_ms(started.elapsed());

        match outcome {
            Ok(Ok(stats)) => {
                self.metrics.probes_succeeded.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    node_id = %self.node_id,
                    test = index,
                    kind = spec.kind(),
                    name = spec.name(),
                    elapsed_ms = elapsed,
                    requests = stats.requests,
                    bytes = stats.bytes,
                    "Probe finished"
                );
                Report::success(elapsed)
            }
            Ok(Err(ProbeError::Cancelled)) => {
                self.metrics.probes_cancelled.fetch_add(1, Ordering::Relaxed);
                Report::cancelled(elapsed, WARNING_CANCELLED_RUNNING)
            }
            Ok(Err(ProbeError::NoPeers)) => {
                self.metrics.probes_cancelled.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(node_id = %self.node_id, test = index, "Network probe has no peers");
                Report::cancelled(elapsed, WARNING_NO_PEERS)
            }
            Ok(Err(e)) => {
                self.metrics.probes_failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    node_id = %self.node_id,
                    test = index,
                    kind = spec.kind(),
                    error = %e,
                    "Probe failed"
                );
                Report::failed(elapsed, e.to_string())
            }
            Err(e) => {
                self.metrics.probes_failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(node_id = %self.node_id, test = index, error = %e, "Probe task died");
                Report::failed(elapsed, "probe panicked")
            }
        }
    }

    async fn settle(&self, run_id: RunId, report: Report) {
        let mut inner = self.inner.write().await;
        let machine = std::mem::take(&mut inner.machine);
        let (machine, actions) = machine.on_event(RunEvent::ProbeSettled { run_id, report });
        inner.machine = machine;

        for action in actions {
            if let RunAction::RunSettled { run_id, reports } = action {
                self.metrics.runs_completed.fetch_add(1, Ordering::Relaxed);
                tracing::info!(node_id = %self.node_id, %run_id, reports, "Run settled");
                self.mark_settled(&mut inner);
            }
        }
    }

    fn mark_settled(&self, inner: &mut RunnerInner) {
        inner.cancel = None;
        self.idle.send_replace(true);
    }
}

/// Whole milliseconds, rounded up: a probe that ran reports at least 1.
fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros().div_ceil(1000))
        .unwrap_or(u64::MAX)
        .max(1)
}
