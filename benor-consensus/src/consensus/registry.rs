use std::collections::{BTreeMap, HashMap};

use benor_common::{ConsensusMessage, MessageKind, NodeId};

/// Stores received messages per round and kind, one per sender.
#[derive(Debug, Default, Clone)]
pub struct MessageRegistry {
    // Round -> Kind -> Sender -> Message
    messages: BTreeMap<u64, HashMap<MessageKind, BTreeMap<NodeId, ConsensusMessage>>>,
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self {
            messages: BTreeMap::new(),
        }
    }

    /// Records a message. Returns `false` if the sender already has a message
    /// for this round and kind; the earlier one is kept.
    pub fn record(&mut self, message: ConsensusMessage) -> bool {
        let bucket = self
            .messages
            .entry(message.round)
            .or_default()
            .entry(message.kind)
            .or_default();

        if bucket.contains_key(&message.sender) {
            return false;
        }
        bucket.insert(message.sender, message);
        true
    }

    /// Snapshot of the messages for a round and kind, ordered by sender.
    pub fn messages_for(&self, round: u64, kind: MessageKind) -> Vec<ConsensusMessage> {
        self.bucket(round, kind)
            .map(|senders| senders.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct senders heard from for a round and kind.
    pub fn count(&self, round: u64, kind: MessageKind) -> usize {
        self.bucket(round, kind).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drops every round strictly below `round`.
    pub fn clear_before(&mut self, round: u64) {
        self.messages = self.messages.split_off(&round);
    }

    /// Rounds that currently hold at least one bucket.
    pub fn rounds(&self) -> Vec<u64> {
        self.messages.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn bucket(&self, round: u64, kind: MessageKind) -> Option<&BTreeMap<NodeId, ConsensusMessage>> {
        self.messages.get(&round).and_then(|kinds| kinds.get(&kind))
    }
}
