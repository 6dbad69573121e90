pub mod env;
pub mod error;
pub mod utils;

pub use env::message::{Bit, ConsensusMessage, MessageKind, Value};
pub use env::state::{NodeState, NodeStatus};
pub use error::{BenOrError, Rejection, Result, TransportError};
pub use utils::NodeId;
