//! consensus
//!
//! Ben-Or randomized binary consensus.
//!
//! Each round has two phases. Nodes first broadcast a proposal carrying their
//! current value; a value backed by a majority of proposals is adopted,
//! otherwise a coin is flipped. Nodes then broadcast a vote; a bit backed by a
//! majority of votes is decided, otherwise the node forgets its value and
//! starts the next round.
//!
//! The pieces are leaf-first: the [`evaluator`] counts values, the
//! [`registry`] stores messages per round and kind, the [`coin`] breaks ties,
//! and the engine drives rounds.

pub mod coin;
pub(crate) mod engine;
pub mod evaluator;
pub mod registry;
