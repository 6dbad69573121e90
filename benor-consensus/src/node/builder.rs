use std::sync::Arc;

use benor_common::{BenOrError, Bit, NodeId, Result};

use super::{core::NodeCore, facade::Node};
use crate::{
    config::ConsensusConfig,
    consensus::coin::{Coin, RandomCoin},
    transport::Transport,
};

/// Validating builder for [`Node`].
pub struct NodeBuilder {
    id: NodeId,
    total_nodes: usize,
    initial_value: Bit,
    faulty: bool,
    config: ConsensusConfig,
    transport: Option<Arc<dyn Transport>>,
    coin: Option<Box<dyn Coin>>,
}

impl NodeBuilder {
    pub fn new(id: NodeId, total_nodes: usize) -> Self {
        Self {
            id,
            total_nodes,
            initial_value: Bit::Zero,
            faulty: false,
            config: ConsensusConfig::default(),
            transport: None,
            coin: None,
        }
    }

    pub fn with_initial_value(mut self, bit: Bit) -> Self {
        self.initial_value = bit;
        self
    }

    pub fn with_faulty(mut self, faulty: bool) -> Self {
        self.faulty = faulty;
        self
    }

    pub fn with_config(mut self, config: ConsensusConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_coin(mut self, coin: impl Coin + 'static) -> Self {
        self.coin = Some(Box::new(coin));
        self
    }

    pub fn build(self) -> Result<Node> {
        if self.total_nodes == 0 {
            return Err(BenOrError::Config("total_nodes must be at least 1".into()));
        }
        NodeId::group_size(self.total_nodes)?;
        if self.id.index() >= self.total_nodes {
            return Err(BenOrError::Config(format!(
                "node id {} is outside [0, {})",
                self.id, self.total_nodes
            )));
        }
        self.config.validate()?;

        let transport = self
            .transport
            .ok_or_else(|| BenOrError::Config("a transport is required".into()))?;
        let coin = self.coin.unwrap_or_else(|| Box::new(RandomCoin::new()));

        let core = NodeCore::new(self.id, self.total_nodes, self.initial_value, self.faulty);
        Ok(Node::from_parts(core, transport, coin, self.config))
    }
}
