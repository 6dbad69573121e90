use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use benor_common::{Bit, ConsensusMessage, MessageKind, NodeId, Value};

use super::{coin::Coin, evaluator::ThresholdEvaluator};
use crate::{
    config::ConsensusConfig,
    node::core::{Checkpoint, NodeCore},
    transport::Transport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundOutcome {
    Advanced(u64),
    Decided(Bit),
    Forced(Bit),
    Killed,
    AlreadyDecided,
}

/// The round loop of one node.
///
/// Built fresh for each accepted `begin_consensus` and consumed by [`run`],
/// which is spawned as the node's single consensus task.
///
/// [`run`]: ConsensusEngine::run
pub(crate) struct ConsensusEngine {
    core: Arc<NodeCore>,
    transport: Arc<dyn Transport>,
    coin: Arc<Mutex<Box<dyn Coin>>>,
    evaluator: ThresholdEvaluator,
    config: ConsensusConfig,
}

impl ConsensusEngine {
    pub(crate) fn new(
        core: Arc<NodeCore>,
        transport: Arc<dyn Transport>,
        coin: Arc<Mutex<Box<dyn Coin>>>,
        config: ConsensusConfig,
    ) -> Self {
        let evaluator = ThresholdEvaluator::new(core.total_nodes());
        Self {
            core,
            transport,
            coin,
            evaluator,
            config,
        }
    }

    pub(crate) async fn run(self) {
        let id = self.core.id();
        info!(
            "🚀 Node {} entering round loop ({} nodes, majority {})",
            id,
            self.core.total_nodes(),
            self.evaluator.threshold()
        );

        loop {
            match self.run_round().await {
                RoundOutcome::Advanced(round) => {
                    debug!("Node {} moving on to round {}", id, round);
                }
                RoundOutcome::Decided(bit) => {
                    info!("✅ Node {} decided {}", id, bit);
                    break;
                }
                RoundOutcome::Forced(bit) => {
                    warn!("⚠️ Node {} forced decision {} after round cap", id, bit);
                    break;
                }
                RoundOutcome::Killed => {
                    info!("🔴 Node {} stopped", id);
                    break;
                }
                RoundOutcome::AlreadyDecided => {
                    debug!("Node {} already decided, nothing to do", id);
                    break;
                }
            }
        }

        self.core.finish();
    }

    async fn run_round(&self) -> RoundOutcome {
        let (round, value) = match self.core.checkpoint().await {
            Checkpoint::Continue { round, value } => (round, value),
            Checkpoint::Decided => return RoundOutcome::AlreadyDecided,
            Checkpoint::Killed => return RoundOutcome::Killed,
        };
        let timeout = self.config.collect_timeout();

        // Phase 1: propose
        self.broadcast(MessageKind::Propose, round, value).await;
        let proposals = self.core.collect(round, MessageKind::Propose, timeout).await;

        if self.core.is_killed().await {
            return RoundOutcome::Killed;
        }

        let vote = match self.evaluator.evaluate(&proposals, false).and_then(Value::bit) {
            Some(bit) => {
                debug!(
                    "Node {} round {}: majority proposal {} ({} received)",
                    self.core.id(),
                    round,
                    bit,
                    proposals.len()
                );
                bit
            }
            None => {
                let bit = self.coin.lock().await.flip();
                debug!(
                    "Node {} round {}: no majority among {} proposals, coin gave {}",
                    self.core.id(),
                    round,
                    proposals.len(),
                    bit
                );
                bit
            }
        };
        self.core.adopt(vote).await;

        if self.core.is_killed().await {
            return RoundOutcome::Killed;
        }

        // Phase 2: vote
        self.broadcast(MessageKind::Vote, round, vote.into()).await;
        let votes = self.core.collect(round, MessageKind::Vote, timeout).await;

        if self.core.is_killed().await {
            return RoundOutcome::Killed;
        }

        if let Some(bit) = self.evaluator.evaluate(&votes, true).and_then(Value::bit) {
            self.core.decide(bit).await;
            tracing::info!(target: "consensus", "EVENT:DECIDE node={} round={} value={} votes={}", self.core.id(), round, bit, votes.len());
            return RoundOutcome::Decided(bit);
        }

        if self.config.max_rounds.is_some_and(|max| round + 1 >= max) {
            self.core.decide(vote).await;
            tracing::warn!(target: "consensus", "EVENT:FORCED_DECIDE node={} round={} value={}", self.core.id(), round, vote);
            return RoundOutcome::Forced(vote);
        }

        let next = self.core.advance().await;
        tracing::info!(target: "consensus", "EVENT:ROUND_ADVANCE node={} round={} votes={}", self.core.id(), next, votes.len());
        RoundOutcome::Advanced(next)
    }

    /// Records our own message, then sends it to every peer on its own task.
    async fn broadcast(&self, kind: MessageKind, round: u64, value: Value) {
        let id = self.core.id();
        let message = ConsensusMessage::new(kind, id, round, value);
        tracing::info!(target: "consensus", "EVENT:{} node={} round={} value={}", kind, id, round, value);

        self.core.record_local(message.clone()).await;

        for peer in NodeId::all(self.core.total_nodes()).filter(|peer| *peer != id) {
            let transport = Arc::clone(&self.transport);
            let message = message.clone();
            tokio::spawn(async move {
                if let Err(e) = transport.send(peer, message).await {
                    warn!("⚠️ Failed to send {} from node {} to node {}: {}", kind, id, peer, e);
                }
            });
        }
    }
}
