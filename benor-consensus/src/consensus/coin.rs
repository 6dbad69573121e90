use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

use benor_common::Bit;

/// Source of the random bit used when proposals carry no majority.
pub trait Coin: Send {
    fn flip(&mut self) -> Bit;
}

/// Fair coin backed by `StdRng`.
#[derive(Debug)]
pub struct RandomCoin {
    rng: StdRng,
}

impl RandomCoin {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible coin for simulations.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomCoin {
    fn default() -> Self {
        Self::new()
    }
}

impl Coin for RandomCoin {
    fn flip(&mut self) -> Bit {
        if self.rng.gen_bool(0.5) {
            Bit::One
        } else {
            Bit::Zero
        }
    }
}

/// Coin that replays a fixed script, then repeats its last outcome.
#[derive(Debug, Clone)]
pub struct ScriptedCoin {
    script: VecDeque<Bit>,
    last: Bit,
}

impl ScriptedCoin {
    pub fn new(script: impl IntoIterator<Item = Bit>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: Bit::Zero,
        }
    }
}

impl Coin for ScriptedCoin {
    fn flip(&mut self) -> Bit {
        if let Some(bit) = self.script.pop_front() {
            self.last = bit;
        }
        self.last
    }
}
