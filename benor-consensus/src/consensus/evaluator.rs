use benor_common::{ConsensusMessage, Value};

/// Minimum number of matching messages for a value to count as a majority.
///
/// Derived from the declared group size, not from the nodes currently alive.
pub fn majority_threshold(total_nodes: usize) -> usize {
    total_nodes / 2 + 1
}

/// Decides whether a set of messages carries a majority value.
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    threshold: usize,
}

impl ThresholdEvaluator {
    pub fn new(total_nodes: usize) -> Self {
        Self {
            threshold: majority_threshold(total_nodes),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns the value whose count reaches the threshold.
    ///
    /// `Value::Unknown` is counted like any other value but is never returned
    /// when `require_decisive` is set. Ties are resolved by the order of
    /// [`Value::ALL`].
    pub fn evaluate<'a, I>(&self, messages: I, require_decisive: bool) -> Option<Value>
    where
        I: IntoIterator<Item = &'a ConsensusMessage>,
    {
        let mut counts = [0usize; 3];
        for message in messages {
            counts[slot(message.value)] += 1;
        }

        Value::ALL
            .into_iter()
            .filter(|value| !(require_decisive && value.is_unknown()))
            .find(|value| counts[slot(*value)] >= self.threshold)
    }
}

fn slot(value: Value) -> usize {
    match value {
        Value::Zero => 0,
        Value::One => 1,
        Value::Unknown => 2,
    }
}
