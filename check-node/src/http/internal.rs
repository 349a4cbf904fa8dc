//! Node-local RPC served to peers. Bodies are MessagePack.

use crate::runner::RunnerError;
use crate::server::CheckNode;
use crate::transport::MSGPACK_CONTENT_TYPE;
use axum::body::Bytes;
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use check_types::{NetcheckAck, NodeStartRequest, NodeStartResponse, WireMessage};
use std::sync::Arc;

fn msgpack<T: WireMessage>(message: &T) -> Response {
    match message.to_bytes() {
        Ok(bytes) => ([(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)], bytes).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode RPC response");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// `POST /internal/self_test/start`
pub async fn start_handler(Extension(node): Extension<Arc<CheckNode>>, body: Bytes) -> Response {
    let request = match NodeStartRequest::from_bytes(&body) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match node.runner().start(request).await {
        Ok(_) => msgpack(&NodeStartResponse::Accepted),
        Err(RunnerError::Busy { run_id }) => msgpack(&NodeStartResponse::Busy { run_id }),
        Err(e @ RunnerError::InvalidPlan(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// `GET /internal/self_test/status`
pub async fn status_handler(Extension(node): Extension<Arc<CheckNode>>) -> Response {
    msgpack(&node.runner().status().await)
}

/// `POST /internal/self_test/stop`
pub async fn stop_handler(Extension(node): Extension<Arc<CheckNode>>) -> Response {
    match node.runner().stop().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// `POST /internal/self_test/netcheck`
pub async fn netcheck_handler(Extension(node): Extension<Arc<CheckNode>>, body: Bytes) -> Response {
    let received = node.runner().handle_netcheck(&body);
    msgpack(&NetcheckAck { received })
}
