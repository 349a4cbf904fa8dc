//! HTTP transport to real peers.
//!
//! Calls the internal endpoints served by every node (see `crate::http`).
//! Bodies are MessagePack; the netcheck payload travels as raw bytes.

use super::{NodeTransport, TransportError};
use crate::config::PeerConfig;
use async_trait::async_trait;
use check_types::{
    NetcheckAck, NodeId, NodeStartRequest, NodeStartResponse, NodeState, WireMessage,
};
use reqwest::header::CONTENT_TYPE;
use std::collections::HashMap;
use std::time::Duration;

/// Content type of internal RPC bodies.
pub const MSGPACK_CONTENT_TYPE: &str = "application/msgpack";

/// HTTP transport.
///
/// No overall request timeout is configured on the client because `stop`
/// legitimately blocks until the peer is idle; callers bound each call.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    peers: HashMap<NodeId, String>,
}

impl HttpTransport {
    /// Create a transport for the given peers.
    pub fn new(peers: &[PeerConfig], connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            peers: peers
                .iter()
                .map(|p| (p.node_id, format!("http://{}", p.address)))
                .collect(),
        })
    }

    fn url(&self, node: NodeId, path: &str) -> Result<String, TransportError> {
        self.peers
            .get(&node)
            .map(|base| format!("{base}/internal/self_test/{path}"))
            .ok_or(TransportError::Unreachable(node))
    }

    async fn send(
        &self,
        node: NodeId,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<u8>, TransportError> {
        let response = request.send().await.map_err(|e| classify(node, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| classify(node, e))?;

        if !status.is_success() {
            return Err(TransportError::Remote {
                node,
                reason: format!("{status}: {}", String::from_utf8_lossy(&body)),
            });
        }

        Ok(body.to_vec())
    }
}

fn classify(node: NodeId, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(node)
    } else if err.is_connect() || err.is_request() {
        tracing::debug!(node_id = %node, error = %err, "Peer connection failed");
        TransportError::Unreachable(node)
    } else {
        TransportError::Remote {
            node,
            reason: err.to_string(),
        }
    }
}

fn decode<T: WireMessage>(bytes: &[u8]) -> Result<T, TransportError> {
    T::from_bytes(bytes).map_err(|e| TransportError::Codec(e.to_string()))
}

#[async_trait]
impl NodeTransport for HttpTransport {
    async fn start(
        &self,
        node: NodeId,
        request: NodeStartRequest,
    ) -> Result<NodeStartResponse, TransportError> {
        let body = request
            .to_bytes()
            .map_err(|e| TransportError::Codec(e.to_string()))?;
        let builder = self
            .client
            .post(self.url(node, "start")?)
            .header(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)
            .body(body);

        let bytes = self.send(node, builder).await?;
        decode(&bytes)
    }

    async fn status(&self, node: NodeId) -> Result<NodeState, TransportError> {
        let builder = self.client.get(self.url(node, "status")?);
        let bytes = self.send(node, builder).await?;
        decode(&bytes)
    }

    async fn stop(&self, node: NodeId) -> Result<(), TransportError> {
        let builder = self.client.post(self.url(node, "stop")?);
        self.send(node, builder).await?;
        Ok(())
    }

    async fn netcheck(&self, node: NodeId, payload: &[u8]) -> Result<u64, TransportError> {
        let builder = self
            .client
            .post(self.url(node, "netcheck")?)
            .body(payload.to_vec());

        let bytes = self.send(node, builder).await?;
        let ack: NetcheckAck = decode(&bytes)?;
        Ok(ack.received)
    }
}
