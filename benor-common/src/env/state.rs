use serde::{Deserialize, Serialize};

use crate::env::message::{Bit, Value};

/// Read-only snapshot of a node's consensus state.
///
/// Faulty nodes report `None` for every consensus field; serialized as JSON
/// these become `null`. Field names on the wire are `killed`, `x`, `decided`
/// and `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub killed: bool,
    #[serde(rename = "x")]
    pub value: Option<Value>,
    pub decided: Option<bool>,
    #[serde(rename = "k")]
    pub round: Option<u64>,
}

impl NodeState {
    /// State of a healthy node before its first round.
    pub fn initial(bit: Bit) -> Self {
        Self {
            killed: false,
            value: Some(bit.into()),
            decided: Some(false),
            round: Some(0),
        }
    }

    /// State of a faulty node: consensus concepts do not apply.
    pub fn faulty() -> Self {
        Self {
            killed: false,
            value: None,
            decided: None,
            round: None,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.decided == Some(true)
    }

    /// The decided bit, if the node has decided.
    pub fn decision(&self) -> Option<Bit> {
        if self.is_decided() {
            self.value.and_then(Value::bit)
        } else {
            None
        }
    }
}

/// Liveness answer a node gives to status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Live,
    Faulty,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Live => "live",
            NodeStatus::Faulty => "faulty",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, NodeStatus::Live)
    }
}
