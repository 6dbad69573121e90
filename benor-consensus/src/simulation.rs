//! simulation.rs
//!
//! Runs a whole consensus group inside one process over a [`LocalNetwork`].
//! Used by the integration tests and the `benor-sim` binary.

use std::{sync::Arc, time::Duration};

use tracing::info;

use benor_common::{BenOrError, Bit, NodeId, NodeState, Rejection, Result};

use crate::{
    config::ConsensusConfig,
    consensus::coin::RandomCoin,
    node::Node,
    transport::{local::LocalNetwork, Transport},
};

pub struct Simulation {
    network: LocalNetwork,
    nodes: Vec<Node>,
}

impl Simulation {
    /// Builds one node per entry of `initial_values`. Nodes listed in
    /// `faulty` are constructed in fault mode. A `seed` makes every coin
    /// reproducible (node `i` uses `seed + i`).
    pub async fn new(
        initial_values: &[Bit],
        faulty: &[NodeId],
        config: ConsensusConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        if initial_values.is_empty() {
            return Err(BenOrError::Config("a simulation needs at least one node".into()));
        }

        let network = LocalNetwork::new();
        let transport: Arc<dyn Transport> = Arc::new(network.clone());
        let total_nodes = initial_values.len();
        let mut nodes = Vec::with_capacity(total_nodes);

        for (id, bit) in NodeId::all(total_nodes).zip(initial_values.iter().copied()) {
            let coin = match seed {
                Some(seed) => RandomCoin::seeded(seed.wrapping_add(id.0 as u64)),
                None => RandomCoin::new(),
            };
            let node = Node::builder(id, total_nodes)
                .with_initial_value(bit)
                .with_faulty(faulty.contains(&id))
                .with_config(config.clone())
                .with_transport(Arc::clone(&transport))
                .with_coin(coin)
                .build()?;
            network.register(&node).await;
            nodes.push(node);
        }

        info!("🧪 Simulation ready with {} nodes ({} faulty)", total_nodes, faulty.len());
        Ok(Self { network, nodes })
    }

    pub fn network(&self) -> &LocalNetwork {
        &self.network
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Triggers `begin_consensus` on every node.
    pub async fn start_all(&self) -> Vec<(NodeId, std::result::Result<(), Rejection>)> {
        let mut results = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            results.push((node.id(), node.begin_consensus().await));
        }
        results
    }

    pub async fn states(&self) -> Vec<NodeState> {
        let mut states = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            states.push(node.state().await);
        }
        states
    }

    /// Polls until every non-faulty node has decided or been killed. Returns
    /// `false` if `timeout` elapsed first.
    pub async fn wait_until_settled(&self, timeout: Duration) -> bool {
        let settled = async {
            loop {
                let states = self.states().await;
                if states
                    .iter()
                    .zip(&self.nodes)
                    .all(|(state, node)| node.is_faulty() || state.is_decided() || state.killed)
                {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(timeout, settled).await.is_ok()
    }

    /// Decided bit of every node, `None` for undecided or faulty ones.
    pub async fn decisions(&self) -> Vec<Option<Bit>> {
        self.states().await.iter().map(NodeState::decision).collect()
    }

    pub async fn stop_all(&self) {
        for node in &self.nodes {
            node.stop().await;
        }
        for node in &self.nodes {
            node.join().await;
        }
    }
}
