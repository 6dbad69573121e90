//! node
//!
//! The externally addressable unit of the protocol. A [`Node`] owns the
//! consensus state of one participant, accepts inbound messages, and runs the
//! round loop on a background task once consensus begins.

mod builder;
pub(crate) mod core;
mod facade;

pub use builder::NodeBuilder;
pub use facade::Node;
