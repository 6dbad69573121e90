use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use benor_common::{BenOrError, NodeId, Result};

/// Installs the global subscriber.
///
/// Protocol events (target `consensus`) go to `<log_dir>/node-<id>.log`;
/// everything else goes to stdout, filtered by `RUST_LOG`. Keep the returned
/// guard alive for the file writer to flush.
pub fn init_tracing(node_id: NodeId, log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, format!("node-{}.log", node_id));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let consensus_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() == "consensus"
        }));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,benor_node=debug".into()))
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() != "consensus"
        }));

    tracing_subscriber::registry()
        .with(consensus_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| BenOrError::Other(format!("tracing init: {e}")))?;

    Ok(guard)
}
