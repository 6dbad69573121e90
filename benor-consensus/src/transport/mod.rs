//! transport
//!
//! Port through which a node reaches its peers. The round loop only needs a
//! point-to-point "send to node N" primitive; failures are reported per peer
//! and never abort a round.

pub mod local;

use async_trait::async_trait;

use benor_common::{ConsensusMessage, NodeId, TransportError};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, to: NodeId, message: ConsensusMessage) -> Result<(), TransportError>;
}
