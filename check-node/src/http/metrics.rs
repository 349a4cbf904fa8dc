//! Prometheus metrics endpoint.

use crate::server::CheckNode;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use check_types::NodeStatus;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format: one gauge for the local run
/// state and the runner's counters (monotonic since startup).
pub async fn metrics_handler(Extension(node): Extension<Arc<CheckNode>>) -> impl IntoResponse {
    let m = node.runner().metrics();

    // Gauges
    let running = u8::from(node.runner().status().await.status() == NodeStatus::Running);
    let members = node.coordinator().members().len();

    // Counters
    let runs_started = m.runs_started.load(Ordering::Relaxed);
    let runs_completed = m.runs_completed.load(Ordering::Relaxed);
    let runs_rejected = m.runs_rejected.load(Ordering::Relaxed);
    let runs_stopped = m.runs_stopped.load(Ordering::Relaxed);
    let probes_succeeded = m.probes_succeeded.load(Ordering::Relaxed);
    let probes_failed = m.probes_failed.load(Ordering::Relaxed);
    let probes_cancelled = m.probes_cancelled.load(Ordering::Relaxed);
    let netcheck_requests = m.netcheck_requests.load(Ordering::Relaxed);
    let netcheck_bytes = m.netcheck_bytes.load(Ordering::Relaxed);

    let body = format!(
        r#"# HELP nodecheck_info Node information
# TYPE nodecheck_info gauge
nodecheck_info{{version="{version}",node_id="{node_id}"}} 1

# HELP nodecheck_run_active Whether a self test is running on this node
# TYPE nodecheck_run_active gauge
nodecheck_run_active {running}

# HELP nodecheck_cluster_members Number of known cluster members
# TYPE nodecheck_cluster_members gauge
nodecheck_cluster_members {members}

# HELP nodecheck_runs_started_total Runs accepted by this node
# TYPE nodecheck_runs_started_total counter
nodecheck_runs_started_total {runs_started}

# HELP nodecheck_runs_completed_total Runs settled by this node
# TYPE nodecheck_runs_completed_total counter
nodecheck_runs_completed_total {runs_completed}

# HELP nodecheck_runs_rejected_total Start requests rejected because a run was in progress
# TYPE nodecheck_runs_rejected_total counter
nodecheck_runs_rejected_total {runs_rejected}

# HELP nodecheck_runs_stopped_total Runs cancelled by a stop
# TYPE nodecheck_runs_stopped_total counter
nodecheck_runs_stopped_total {runs_stopped}

# HELP nodecheck_probes_total Probes settled, by outcome
# TYPE nodecheck_probes_total counter
nodecheck_probes_total{{outcome="success"}} {probes_succeeded}
nodecheck_probes_total{{outcome="error"}} {probes_failed}
nodecheck_probes_total{{outcome="cancelled"}} {probes_cancelled}

# HELP nodecheck_netcheck_requests_total Network probe payloads received from peers
# TYPE nodecheck_netcheck_requests_total counter
nodecheck_netcheck_requests_total {netcheck_requests}

# HELP nodecheck_netcheck_bytes_total Network probe bytes received from peers
# TYPE nodecheck_netcheck_bytes_total counter
nodecheck_netcheck_bytes_total {netcheck_bytes}
"#,
        version = env!("CARGO_PKG_VERSION"),
        node_id = node.node_id(),
    );

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
