//! Runs a whole group in one process and prints the final states as JSON.

use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use benor_common::{Bit, NodeId};
use benor_consensus::{ConsensusConfig, Simulation};

#[derive(Debug, Parser)]
#[command(name = "benor-sim", about = "In-process Ben-Or consensus simulation")]
struct Args {
    /// Initial bits, one per node (e.g. 1,0,1)
    #[arg(long, value_delimiter = ',', default_values_t = [1u8, 0, 1])]
    values: Vec<u8>,

    /// Ids of the nodes started in fault mode
    #[arg(long, value_delimiter = ',')]
    faulty: Vec<u32>,

    #[arg(long, default_value_t = 200)]
    timeout_ms: u64,

    /// Seed for reproducible coins
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    max_rounds: Option<u64>,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 30)]
    deadline_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let values = args
        .values
        .iter()
        .map(|v| Bit::try_from(*v))
        .collect::<Result<Vec<_>, _>>()?;
    let faulty: Vec<NodeId> = args.faulty.iter().copied().map(NodeId).collect();

    let config = ConsensusConfig::default()
        .with_timeout(Duration::from_millis(args.timeout_ms))
        .with_max_rounds(args.max_rounds);
    config.validate()?;

    let simulation = Simulation::new(&values, &faulty, config, args.seed).await?;
    for (id, res) in simulation.start_all().await {
        if let Err(reason) = res {
            info!("Node {} did not start: {}", id, reason);
        }
    }

    if !simulation.wait_until_settled(Duration::from_secs(args.deadline_secs)).await {
        warn!("⏰ Deadline reached before every live node decided");
    }
    let states = simulation.states().await;
    simulation.stop_all().await;

    println!("{}", serde_json::to_string_pretty(&states)?);
    Ok(())
}
