use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

use benor_common::{ConsensusMessage, NodeState, Rejection, Result};
use benor_consensus::Node;

/// Body of every non-state response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Rejection>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: None,
        }
    }

    pub fn rejected(reason: Rejection) -> Self {
        Self {
            message: reason.to_string(),
            reason: Some(reason),
        }
    }
}

type Reply = (StatusCode, Json<ApiResponse>);

pub fn router(node: Node) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/getState", get(get_state))
        .route("/start", get(start))
        .route("/stop", get(stop))
        .route("/message", post(message))
        .with_state(node)
}

pub async fn start_rest_api(listener: TcpListener, node: Node) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("REST API for node {} listening on {}", node.id(), addr);
    }
    axum::serve(listener, router(node)).await?;
    Ok(())
}

async fn status(State(node): State<Node>) -> Reply {
    let status = node.status();
    let code = if status.is_live() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (code, Json(ApiResponse::ok(status.as_str())))
}

async fn get_state(State(node): State<Node>) -> Json<NodeState> {
    Json(node.state().await)
}

async fn start(State(node): State<Node>) -> Reply {
    match node.begin_consensus().await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok("Consensus started"))),
        Err(reason) => (StatusCode::BAD_REQUEST, Json(ApiResponse::rejected(reason))),
    }
}

async fn stop(State(node): State<Node>) -> Reply {
    node.stop().await;
    (StatusCode::OK, Json(ApiResponse::ok("Node stopped")))
}

async fn message(State(node): State<Node>, Json(message): Json<ConsensusMessage>) -> Reply {
    debug!("📩 Node {} received {} from {} (round {})", node.id(), message.kind, message.sender, message.round);
    match node.deliver(message).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok("Message received"))),
        Err(reason) => (StatusCode::BAD_REQUEST, Json(ApiResponse::rejected(reason))),
    }
}
