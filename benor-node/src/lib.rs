pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod runtime;
pub mod transport;

pub use config::NodeConfig;
pub use runtime::builder::{build_runtime, NodeRuntime};
