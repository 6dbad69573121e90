use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info};

use benor_common::{ConsensusMessage, NodeId, NodeState, NodeStatus, Rejection};

use super::{builder::NodeBuilder, core::NodeCore};
use crate::{
    config::ConsensusConfig,
    consensus::{coin::Coin, engine::ConsensusEngine, evaluator::majority_threshold},
    transport::Transport,
};

/// Handle to one consensus participant.
///
/// Cloning is cheap and every clone addresses the same node. Mutation only
/// happens through [`begin_consensus`](Node::begin_consensus),
/// [`stop`](Node::stop) and [`deliver`](Node::deliver).
#[derive(Clone)]
pub struct Node {
    core: Arc<NodeCore>,
    transport: Arc<dyn Transport>,
    coin: Arc<Mutex<Box<dyn Coin>>>,
    config: ConsensusConfig,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.core.id())
            .field("total_nodes", &self.core.total_nodes())
            .field("faulty", &self.core.is_faulty())
            .field("config", &self.config)
            .finish()
    }
}

impl Node {
    pub fn builder(id: NodeId, total_nodes: usize) -> NodeBuilder {
        NodeBuilder::new(id, total_nodes)
    }

    pub(crate) fn from_parts(
        core: NodeCore,
        transport: Arc<dyn Transport>,
        coin: Box<dyn Coin>,
        config: ConsensusConfig,
    ) -> Self {
        Self {
            core: Arc::new(core),
            transport,
            coin: Arc::new(Mutex::new(coin)),
            config,
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> NodeId {
        self.core.id()
    }

    pub fn total_nodes(&self) -> usize {
        self.core.total_nodes()
    }

    pub fn majority(&self) -> usize {
        majority_threshold(self.core.total_nodes())
    }

    pub fn is_faulty(&self) -> bool {
        self.core.is_faulty()
    }

    pub fn status(&self) -> NodeStatus {
        self.core.status()
    }

    /// Whether a round loop is currently active.
    pub fn is_running(&self) -> bool {
        self.core.is_running()
    }

    pub async fn state(&self) -> NodeState {
        self.core.snapshot().await
    }

    /// Starts the round loop on a background task.
    ///
    /// Rejected on a faulty or killed node, and while a loop is already
    /// running. On a decided node the loop exits immediately.
    pub async fn begin_consensus(&self) -> Result<(), Rejection> {
        if self.core.is_faulty() {
            return Err(Rejection::Faulty);
        }
        if self.core.is_killed().await {
            return Err(Rejection::Killed);
        }
        if !self.core.try_start() {
            return Err(Rejection::AlreadyRunning);
        }

        let engine = ConsensusEngine::new(
            Arc::clone(&self.core),
            Arc::clone(&self.transport),
            Arc::clone(&self.coin),
            self.config.clone(),
        );
        let handle = tokio::spawn(engine.run());
        *self.task.lock().await = Some(handle);

        tracing::info!(target: "consensus", "EVENT:BEGIN node={}", self.core.id());
        Ok(())
    }

    /// Kills the node. Idempotent; the round loop exits at its next
    /// checkpoint.
    pub async fn stop(&self) {
        if self.core.kill().await {
            info!("🛑 Stopping node {}", self.core.id());
            tracing::info!(target: "consensus", "EVENT:STOP node={}", self.core.id());
        }
    }

    /// Hands an inbound message to the node.
    pub async fn deliver(&self, message: ConsensusMessage) -> Result<(), Rejection> {
        self.core.deliver(message).await
    }

    /// Waits for the current round loop, if any, to finish.
    pub async fn join(&self) {
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Round loop of node {} ended abnormally: {}", self.core.id(), e);
            }
        }
    }

    pub(crate) fn core(&self) -> Arc<NodeCore> {
        Arc::clone(&self.core)
    }
}
