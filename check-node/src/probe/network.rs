//! Network probe.
//!
//! Sends `request_size` payloads to every other participant of the run,
//! with `parallelism` concurrent senders per peer. The first peer that
//! cannot be reached fails the whole probe.

use super::{Budget, Probe, ProbeContext, ProbeError, ProbeStats};
use crate::transport::{NodeTransport, TransportError};
use async_trait::async_trait;
use check_types::{NetworkTestSpec, NodeId};
use futures_util::future::try_join_all;
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Network probe.
pub struct NetworkProbe {
    spec: NetworkTestSpec,
    peers: Vec<NodeId>,
    transport: Arc<dyn NodeTransport>,
    parallelism: usize,
    rpc_timeout: Duration,
}

impl NetworkProbe {
    /// Create a network probe for `spec` on the node described by `ctx`.
    pub fn new(spec: NetworkTestSpec, ctx: &ProbeContext) -> Self {
        let parallelism = ctx.clamp_parallelism(spec.parallelism);
        let peers = ctx
            .peers
            .iter()
            .copied()
            .filter(|peer| *peer != ctx.node_id)
            .collect();

        Self {
            spec,
            peers,
            transport: ctx.transport.clone(),
            parallelism,
            rpc_timeout: ctx.rpc_timeout,
        }
    }

    async fn worker(
        &self,
        peer: NodeId,
        payload: &[u8],
        budget: Budget,
        cancel: &CancellationToken,
    ) -> Result<ProbeStats, ProbeError> {
        let mut stats = ProbeStats::default();

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
                result = tokio::time::timeout(
                    self.rpc_timeout,
                    self.transport.netcheck(peer, payload),
                ) => match result {
                    Ok(Ok(received)) => received,
                    Ok(Err(e)) => return Err(map_transport_error(peer, e)),
                    Err(_) => return Err(ProbeError::PeerUnreachable(peer)),
                },
            };

            stats.requests += 1;
            stats.bytes += received;

            if budget.exhausted() {
                return Ok(stats);
            }

            // Peers that answer without suspending would otherwise starve
            // the cancellation branch.
            tokio::task::yield_now().await;
        }
    }
}

fn map_transport_error(peer: NodeId, err: TransportError) -> ProbeError {
    if err.is_connectivity() {
        ProbeError::PeerUnreachable(peer)
    } else {
        ProbeError::PeerFailed {
            node: peer,
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl Probe for NetworkProbe {
    async fn run(&self, cancel: CancellationToken) -> Result<ProbeStats, ProbeError> {
        if self.peers.is_empty() {
            return Err(ProbeError::NoPeers);
        }

        let mut payload = vec![0u8; self.spec.request_size as usize];
        rand::thread_rng().fill_bytes(&mut payload);

        let budget = Budget::from_millis(self.spec.duration_ms);
        let workers = self.peers.iter().flat_map(|&peer| {
            let payload = &payload;
            let cancel = &cancel;
            (0..self.parallelism).map(move |_| self.worker(peer, payload, budget, cancel))
        });

        let results = try_join_all(workers).await?;

        Ok(results
            .into_iter()
            .fold(ProbeStats::default(), ProbeStats::merge))
    }
}
