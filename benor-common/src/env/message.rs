//! message.rs
//!
//! Values and messages exchanged by the Ben-Or protocol.
//!
//! The JSON encoding matches the HTTP API of the node process: bits travel as
//! `0`/`1`, the undecided value as `"?"`, and a message looks like
//! `{"type":"PROPOSE","sender":0,"step":3,"value":"?"}`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::BenOrError, utils::NodeId};

/// A binary value a node can decide on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Bit {
    Zero,
    One,
}

impl From<Bit> for u8 {
    fn from(bit: Bit) -> Self {
        match bit {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }
}

impl TryFrom<u8> for Bit {
    type Error = BenOrError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Bit::Zero),
            1 => Ok(Bit::One),
            other => Err(BenOrError::Config(format!("{other} is not a bit (expected 0 or 1)"))),
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// The value a node holds or carries in a message: a bit, or unknown after a
/// round that ended without a decisive vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireValue", into = "WireValue")]
pub enum Value {
    Zero,
    One,
    Unknown,
}

impl Value {
    /// Fixed enumeration order used wherever values are scanned.
    pub const ALL: [Value; 3] = [Value::Zero, Value::One, Value::Unknown];

    pub fn bit(self) -> Option<Bit> {
        match self {
            Value::Zero => Some(Bit::Zero),
            Value::One => Some(Bit::One),
            Value::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Value::Unknown)
    }
}

impl From<Bit> for Value {
    fn from(bit: Bit) -> Self {
        match bit {
            Bit::Zero => Value::Zero,
            Bit::One => Value::One,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Zero => write!(f, "0"),
            Value::One => write!(f, "1"),
            Value::Unknown => write!(f, "?"),
        }
    }
}

const UNKNOWN_MARK: &str = "?";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Bit(u8),
    Mark(String),
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        match value.bit() {
            Some(bit) => WireValue::Bit(bit.into()),
            None => WireValue::Mark(UNKNOWN_MARK.to_string()),
        }
    }
}

impl TryFrom<WireValue> for Value {
    type Error = BenOrError;

    fn try_from(wire: WireValue) -> Result<Self, Self::Error> {
        match wire {
            WireValue::Bit(raw) => Bit::try_from(raw).map(Value::from),
            WireValue::Mark(mark) if mark == UNKNOWN_MARK => Ok(Value::Unknown),
            WireValue::Mark(other) => Err(BenOrError::Other(format!("unexpected value marker {other:?}"))),
        }
    }
}

/// The two message kinds of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    Propose,
    Vote,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Propose => write!(f, "PROPOSE"),
            MessageKind::Vote => write!(f, "VOTE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub sender: NodeId,
    #[serde(rename = "step")]
    pub round: u64,
    pub value: Value,
}

impl ConsensusMessage {
    pub fn new(kind: MessageKind, sender: NodeId, round: u64, value: Value) -> Self {
        Self { kind, sender, round, value }
    }

    pub fn propose(sender: NodeId, round: u64, value: Value) -> Self {
        Self::new(MessageKind::Propose, sender, round, value)
    }

    pub fn vote(sender: NodeId, round: u64, value: Value) -> Self {
        Self::new(MessageKind::Vote, sender, round, value)
    }
}
