use clap::Parser;
use tracing::{error, info};

use benor_node::{build_runtime, cli::Args, logging::init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let log_dir = args.log_dir.clone();
    let config = args.into_config()?;

    let _guard = init_tracing(config.node_id, &log_dir)?;

    let runtime = build_runtime(config).await?;
    let node = runtime.node.clone();

    tokio::select! {
        res = runtime.serve() => {
            if let Err(e) = res {
                error!("❌ REST API stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown signal received");
        }
    }

    let was_running = node.is_running();
    node.stop().await;
    if was_running {
        info!("⏳ Waiting for the round loop of node {} to wind down", node.id());
    }
    node.join().await;
    info!("👋 Node {} exited", node.id());
    Ok(())
}
