use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::NodeId;

pub type Result<T> = std::result::Result<T, BenOrError>;

#[derive(Debug, Error)]
pub enum BenOrError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other: {0}")]
    Other(String),
}

/// Why a node refused a `begin_consensus` or `deliver` request.
///
/// These are expected outcomes, not failures: the caller decides whether to
/// retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    #[error("node is faulty")]
    Faulty,

    #[error("node is killed")]
    Killed,

    #[error("consensus already running")]
    AlreadyRunning,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Peer {0} not found")]
    PeerNotFound(NodeId),

    #[error("Peer {0} is unreachable")]
    Unreachable(NodeId),

    #[error("Peer {0} rejected message: {1}")]
    Rejected(NodeId, Rejection),

    #[error("Failed to send message: {0}")]
    Send(String),
}
