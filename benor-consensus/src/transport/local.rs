use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use benor_common::{ConsensusMessage, NodeId, TransportError};

use super::Transport;
use crate::node::{core::NodeCore, Node};

/// In-process network connecting nodes of a single runtime.
///
/// Every registered node can be addressed by id. Links can be cut in both
/// directions to simulate unreachable peers.
#[derive(Clone, Default)]
pub struct LocalNetwork {
    peers: Arc<RwLock<HashMap<NodeId, Arc<NodeCore>>>>,
    partitions: Arc<RwLock<HashSet<(NodeId, NodeId)>>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, node: &Node) {
        self.peers.write().await.insert(node.id(), node.core());
    }

    pub async fn unregister(&self, id: NodeId) {
        self.peers.write().await.remove(&id);
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Cuts the link between `a` and `b` in both directions.
    pub async fn partition(&self, a: NodeId, b: NodeId) {
        let mut partitions = self.partitions.write().await;
        partitions.insert((a, b));
        partitions.insert((b, a));
    }

    pub async fn heal(&self) {
        self.partitions.write().await.clear();
    }
}

#[async_trait]
impl Transport for LocalNetwork {
    async fn send(&self, to: NodeId, message: ConsensusMessage) -> Result<(), TransportError> {
        if self.partitions.read().await.contains(&(message.sender, to)) {
            return Err(TransportError::Unreachable(to));
        }

        let peer = self
            .peers
            .read()
            .await
            .get(&to)
            .cloned()
            .ok_or(TransportError::PeerNotFound(to))?;

        peer.deliver(message)
            .await
            .map_err(|rejection| TransportError::Rejected(to, rejection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benor_common::{Bit, Rejection, Value};

    async fn node(network: &LocalNetwork, id: u32, faulty: bool) -> Node {
        let node = Node::builder(NodeId(id), 3)
            .with_initial_value(Bit::One)
            .with_faulty(faulty)
            .with_transport(Arc::new(network.clone()))
            .build()
            .unwrap();
        network.register(&node).await;
        node
    }

    #[tokio::test]
    async fn test_send_reaches_registered_peer() {
        let network = LocalNetwork::new();
        let _a = node(&network, 0, false).await;
        let _b = node(&network, 1, false).await;
        assert_eq!(network.peer_count().await, 2);

        let msg = ConsensusMessage::propose(NodeId(0), 0, Value::One);
        assert!(network.send(NodeId(1), msg.clone()).await.is_ok());
        assert!(matches!(
            network.send(NodeId(2), msg).await,
            Err(TransportError::PeerNotFound(NodeId(2)))
        ));
    }

    #[tokio::test]
    async fn test_faulty_peer_rejects() {
        let network = LocalNetwork::new();
        let _faulty = node(&network, 1, true).await;

        let msg = ConsensusMessage::vote(NodeId(0), 0, Value::Zero);
        assert!(matches!(
            network.send(NodeId(1), msg).await,
            Err(TransportError::Rejected(NodeId(1), Rejection::Faulty))
        ));
    }

    #[tokio::test]
    async fn test_partition_and_heal() {
        let network = LocalNetwork::new();
        let _a = node(&network, 0, false).await;
        let _b = node(&network, 1, false).await;
        network.partition(NodeId(0), NodeId(1)).await;

        let msg = ConsensusMessage::propose(NodeId(1), 0, Value::One);
        assert!(matches!(
            network.send(NodeId(0), msg.clone()).await,
            Err(TransportError::Unreachable(NodeId(0)))
        ));

        network.heal().await;
        assert!(network.send(NodeId(0), msg).await.is_ok());

        network.unregister(NodeId(0)).await;
        assert_eq!(network.peer_count().await, 1);
    }
}
