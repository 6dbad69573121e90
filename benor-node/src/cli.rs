use std::path::PathBuf;

use clap::{ArgAction, Parser};

use benor_common::{Bit, NodeId, Result};

use crate::config::{NodeConfig, DEFAULT_BASE_PORT, DEFAULT_HOST};

/// Ben-Or consensus node.
///
/// Positional arguments follow `node_id initial_value total_nodes [faulty]`.
/// When `--config` is given the file replaces the positional values; the
/// `--timeout-ms` and `--max-rounds` flags still override it.
#[derive(Debug, Parser)]
#[command(name = "benor-node", version, about = "Ben-Or randomized binary consensus node")]
pub struct Args {
    /// Identity of this node, in [0, total_nodes)
    #[arg(default_value_t = 0)]
    pub node_id: u32,

    /// Initial bit (0 or 1)
    #[arg(default_value_t = 0)]
    pub initial_value: u8,

    /// Number of nodes in the group
    #[arg(default_value_t = 3)]
    pub total_nodes: usize,

    /// Start in fault mode
    #[arg(default_value_t = false, action = ArgAction::Set)]
    pub faulty: bool,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_BASE_PORT)]
    pub base_port: u16,

    /// Upper bound of each collection phase
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Force a decision after this many rounds (off by default)
    #[arg(long)]
    pub max_rounds: Option<u64>,

    /// Directory receiving the consensus event log
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,
}

impl Args {
    pub fn into_config(self) -> Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load_from_file(path)?,
            None => {
                let mut config = NodeConfig::new(
                    NodeId(self.node_id),
                    Bit::try_from(self.initial_value)?,
                    self.total_nodes,
                );
                config.faulty = self.faulty;
                config.host = self.host.clone();
                config.base_port = self.base_port;
                config
            }
        };

        if let Some(timeout_ms) = self.timeout_ms {
            config.consensus.collect_timeout_ms = timeout_ms;
        }
        if let Some(max_rounds) = self.max_rounds {
            config.consensus.max_rounds = Some(max_rounds);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benor_common::BenOrError;

    #[test]
    fn test_positional_arguments() {
        let args = Args::try_parse_from(["benor-node", "1", "1", "5", "true"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.node_id, NodeId(1));
        assert_eq!(config.initial_value, Bit::One);
        assert_eq!(config.total_nodes, 5);
        assert!(config.faulty);
        assert_eq!(config.base_port, 3000);
    }

    #[test]
    fn test_defaults_match_three_node_group() {
        let config = Args::try_parse_from(["benor-node"]).unwrap().into_config().unwrap();
        assert_eq!(config, NodeConfig::new(NodeId(0), Bit::Zero, 3));
    }

    #[test]
    fn test_flags_override() {
        let args = Args::try_parse_from([
            "benor-node", "0", "1", "3", "--timeout-ms", "250", "--max-rounds", "10", "--base-port", "4000",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.consensus.collect_timeout_ms, 250);
        assert_eq!(config.consensus.max_rounds, Some(10));
        assert_eq!(config.listen_port().unwrap(), 4000);
    }

    #[test]
    fn test_invalid_bit_is_config_error() {
        let args = Args::try_parse_from(["benor-node", "0", "2", "3"]).unwrap();
        assert!(matches!(args.into_config(), Err(BenOrError::Config(_))));
    }

    #[test]
    fn test_config_file_replaces_positionals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.json");
        let mut stored = NodeConfig::new(NodeId(2), Bit::One, 4);
        stored.base_port = 5000;
        stored.save_to_file(&path).unwrap();

        let args = Args::try_parse_from([
            "benor-node", "0", "0", "3", "--config", path.to_str().unwrap(), "--timeout-ms", "80",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.node_id, NodeId(2));
        assert_eq!(config.total_nodes, 4);
        assert_eq!(config.base_port, 5000);
        assert_eq!(config.consensus.collect_timeout_ms, 80);
    }
}
