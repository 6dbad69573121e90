pub mod config;
pub mod consensus;
pub mod node;
pub mod simulation;
pub mod transport;

pub use config::ConsensusConfig;
pub use consensus::coin::{Coin, RandomCoin, ScriptedCoin};
pub use consensus::evaluator::{majority_threshold, ThresholdEvaluator};
pub use consensus::registry::MessageRegistry;
pub use node::{Node, NodeBuilder};
pub use simulation::Simulation;
pub use transport::{local::LocalNetwork, Transport};
