//! utils
//!
//! Small shared types used across the Ben-Or workspace.

pub mod node_id;
pub use node_id::NodeId;
