use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::Instant;
use tracing::debug;

use benor_common::{
    Bit, ConsensusMessage, MessageKind, NodeId, NodeState, NodeStatus, Rejection, Value,
};

use crate::consensus::registry::MessageRegistry;

/// What the round loop should do next, read at a phase boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkpoint {
    Continue { round: u64, value: Value },
    Decided,
    Killed,
}

/// State shared between a node's facade, its round loop, and whoever delivers
/// messages to it.
#[derive(Debug)]
pub(crate) struct NodeCore {
    id: NodeId,
    total_nodes: usize,
    faulty: bool,
    state: RwLock<NodeState>,
    registry: Mutex<MessageRegistry>,
    arrivals: Notify,
    running: AtomicBool,
}

impl NodeCore {
    pub(crate) fn new(id: NodeId, total_nodes: usize, initial_value: Bit, faulty: bool) -> Self {
        let state = if faulty {
            NodeState::faulty()
        } else {
            NodeState::initial(initial_value)
        };

        Self {
            id,
            total_nodes,
            faulty,
            state: RwLock::new(state),
            registry: Mutex::new(MessageRegistry::new()),
            arrivals: Notify::new(),
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    pub(crate) fn is_faulty(&self) -> bool {
        self.faulty
    }

    pub(crate) fn status(&self) -> NodeStatus {
        if self.faulty {
            NodeStatus::Faulty
        } else {
            NodeStatus::Live
        }
    }

    pub(crate) async fn snapshot(&self) -> NodeState {
        *self.state.read().await
    }

    pub(crate) async fn is_killed(&self) -> bool {
        self.state.read().await.killed
    }

    /// Marks the node killed and wakes a pending collection. Returns `true`
    /// the first time only.
    pub(crate) async fn kill(&self) -> bool {
        let first = {
            let mut state = self.state.write().await;
            let first = !state.killed;
            state.killed = true;
            first
        };
        self.arrivals.notify_waiters();
        first
    }

    pub(crate) fn try_start(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn finish(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Admits an inbound message.
    ///
    /// Messages for the current or a later round are stored; stale rounds,
    /// unknown senders and duplicates are dropped without signalling the
    /// sender. A decided node drops everything.
    pub(crate) async fn deliver(&self, message: ConsensusMessage) -> Result<(), Rejection> {
        if self.faulty {
            return Err(Rejection::Faulty);
        }

        let current = {
            let state = self.state.read().await;
            if state.killed {
                return Err(Rejection::Killed);
            }
            if state.is_decided() {
                return Ok(());
            }
            state.round.unwrap_or(0)
        };

        if message.sender.index() >= self.total_nodes {
            debug!("Node {} dropped {} from unknown sender {}", self.id, message.kind, message.sender);
            return Ok(());
        }

        if message.round < current {
            debug!(
                "Node {} dropped stale {} from {} (round {} < {})",
                self.id, message.kind, message.sender, message.round, current
            );
            return Ok(());
        }

        self.record_local(message).await;
        Ok(())
    }

    /// Stores a message without admission checks and wakes the collector.
    pub(crate) async fn record_local(&self, message: ConsensusMessage) {
        let (sender, kind, round) = (message.sender, message.kind, message.round);
        let inserted = self.registry.lock().await.record(message);
        if inserted {
            self.arrivals.notify_waiters();
        } else {
            debug!("Node {} ignored duplicate {} from {} in round {}", self.id, kind, sender, round);
        }
    }

    /// Waits until every node of the group has sent a `kind` message for
    /// `round`, the node is killed, or `timeout` elapses; then returns what
    /// arrived.
    pub(crate) async fn collect(
        &self,
        round: u64,
        kind: MessageKind,
        timeout: Duration,
    ) -> Vec<ConsensusMessage> {
        let now = Instant::now();
        // ~30 years, for timeouts past what `Instant` can represent
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30));

        loop {
            let notified = self.arrivals.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.registry.lock().await.count(round, kind) >= self.total_nodes {
                break;
            }
            if self.is_killed().await {
                break;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                break;
            }
        }

        self.registry.lock().await.messages_for(round, kind)
    }

    pub(crate) async fn checkpoint(&self) -> Checkpoint {
        let state = self.state.read().await;
        if state.killed {
            Checkpoint::Killed
        } else if state.is_decided() {
            Checkpoint::Decided
        } else {
            Checkpoint::Continue {
                round: state.round.unwrap_or(0),
                value: state.value.unwrap_or(Value::Unknown),
            }
        }
    }

    /// Sets the value carried into the vote phase.
    pub(crate) async fn adopt(&self, bit: Bit) {
        let mut state = self.state.write().await;
        if !state.is_decided() {
            state.value = Some(bit.into());
        }
    }

    /// Freezes the value and drops every buffered message; a decided node
    /// never reads its registry again.
    pub(crate) async fn decide(&self, bit: Bit) {
        {
            let mut state = self.state.write().await;
            if state.is_decided() {
                return;
            }
            state.value = Some(bit.into());
            state.decided = Some(true);
        }

        let mut registry = self.registry.lock().await;
        if !registry.is_empty() {
            debug!("Node {} discarded {} buffered round(s) after deciding", self.id, registry.rounds().len());
            registry.clear();
        }
    }

    /// Closes the current round without a decision and returns the new round.
    pub(crate) async fn advance(&self) -> u64 {
        let next = {
            let mut state = self.state.write().await;
            let next = state.round.unwrap_or(0) + 1;
            state.round = Some(next);
            state.value = Some(Value::Unknown);
            next
        };
        self.registry.lock().await.clear_before(next);
        next
    }

    #[cfg(test)]
    pub(crate) async fn stored(&self, round: u64, kind: MessageKind) -> Vec<ConsensusMessage> {
        self.registry.lock().await.messages_for(round, kind)
    }

    #[cfg(test)]
    pub(crate) async fn stored_rounds(&self) -> Vec<u64> {
        self.registry.lock().await.rounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core(total: usize) -> NodeCore {
        NodeCore::new(NodeId(0), total, Bit::One, false)
    }

    #[tokio::test]
    async fn test_future_rounds_are_buffered_and_stale_dropped() {
        let core = core(3);
        core.deliver(ConsensusMessage::propose(NodeId(1), 0, Value::One)).await.unwrap();
        core.deliver(ConsensusMessage::propose(NodeId(1), 2, Value::Zero)).await.unwrap();

        assert_eq!(core.advance().await, 1);
        assert!(core.stored(0, MessageKind::Propose).await.is_empty());
        assert_eq!(core.stored(2, MessageKind::Propose).await.len(), 1);

        // Round 0 is now stale
        core.deliver(ConsensusMessage::vote(NodeId(2), 0, Value::One)).await.unwrap();
        assert!(core.stored(0, MessageKind::Vote).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sender_dropped() {
        let core = core(3);
        core.deliver(ConsensusMessage::propose(NodeId(9), 0, Value::One)).await.unwrap();
        assert!(core.stored(0, MessageKind::Propose).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_sender_keeps_first() {
        let core = core(3);
        core.deliver(ConsensusMessage::vote(NodeId(2), 0, Value::One)).await.unwrap();
        core.deliver(ConsensusMessage::vote(NodeId(2), 0, Value::Zero)).await.unwrap();
        assert_eq!(
            core.stored(0, MessageKind::Vote).await,
            vec![ConsensusMessage::vote(NodeId(2), 0, Value::One)]
        );
    }

    #[tokio::test]
    async fn test_killed_and_faulty_reject() {
        let core = core(3);
        assert!(core.kill().await);
        assert!(!core.kill().await);
        assert_eq!(
            core.deliver(ConsensusMessage::propose(NodeId(1), 0, Value::One)).await,
            Err(Rejection::Killed)
        );

        let faulty = NodeCore::new(NodeId(1), 3, Bit::Zero, true);
        assert_eq!(
            faulty.deliver(ConsensusMessage::propose(NodeId(0), 0, Value::One)).await,
            Err(Rejection::Faulty)
        );
        assert_eq!(faulty.snapshot().await, NodeState::faulty());
    }

    #[tokio::test]
    async fn test_collect_returns_early_when_everyone_heard() {
        let core = core(2);
        core.record_local(ConsensusMessage::propose(NodeId(0), 0, Value::One)).await;
        core.record_local(ConsensusMessage::propose(NodeId(1), 0, Value::One)).await;

        let started = std::time::Instant::now();
        let msgs = core.collect(0, MessageKind::Propose, Duration::from_secs(30)).await;
        assert_eq!(msgs.len(), 2);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_collect_times_out_with_partial_messages() {
        let core = core(3);
        core.record_local(ConsensusMessage::vote(NodeId(0), 0, Value::Zero)).await;
        let msgs = core.collect(0, MessageKind::Vote, Duration::from_millis(30)).await;
        assert_eq!(msgs.len(), 1);
    }

    #[tokio::test]
    async fn test_decision_freezes_value() {
        let core = core(3);
        core.decide(Bit::Zero).await;
        core.adopt(Bit::One).await;
        core.decide(Bit::One).await;

        let state = core.snapshot().await;
        assert_eq!(state.decision(), Some(Bit::Zero));
        assert_eq!(core.checkpoint().await, Checkpoint::Decided);
    }

    #[tokio::test]
    async fn test_decided_node_stops_buffering() {
        let core = core(3);
        core.deliver(ConsensusMessage::propose(NodeId(1), 1, Value::One)).await.unwrap();
        core.decide(Bit::One).await;
        assert!(core.stored_rounds().await.is_empty());

        for round in 1..=500 {
            core.deliver(ConsensusMessage::propose(NodeId(2), round, Value::One)).await.unwrap();
            core.deliver(ConsensusMessage::vote(NodeId(2), round, Value::One)).await.unwrap();
        }
        assert!(core.stored_rounds().await.is_empty());
    }
}
