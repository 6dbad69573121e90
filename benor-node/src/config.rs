use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use benor_common::{BenOrError, Bit, NodeId, Result};
use benor_consensus::ConsensusConfig;

pub const DEFAULT_BASE_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Everything a node process needs to join its group.
///
/// Node `i` listens on `base_port + i`; peers are addressed the same way on
/// `host`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_id: NodeId,
    pub initial_value: Bit,
    pub total_nodes: usize,
    #[serde(default)]
    pub faulty: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_base_port")]
    pub base_port: u16,
    #[serde(default)]
    pub consensus: ConsensusConfig,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_base_port() -> u16 {
    DEFAULT_BASE_PORT
}

impl NodeConfig {
    pub fn new(node_id: NodeId, initial_value: Bit, total_nodes: usize) -> Self {
        Self {
            node_id,
            initial_value,
            total_nodes,
            faulty: false,
            host: default_host(),
            base_port: DEFAULT_BASE_PORT,
            consensus: ConsensusConfig::default(),
        }
    }

    pub fn port_of(&self, id: NodeId) -> Result<u16> {
        u16::try_from(id.0)
            .ok()
            .and_then(|offset| self.base_port.checked_add(offset))
            .ok_or_else(|| BenOrError::Config(format!("port for node {} overflows", id)))
    }

    pub fn listen_port(&self) -> Result<u16> {
        self.port_of(self.node_id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_nodes == 0 {
            return Err(BenOrError::Config("total_nodes must be at least 1".into()));
        }
        if self.node_id.index() >= self.total_nodes {
            return Err(BenOrError::Config(format!(
                "node_id {} is outside [0, {})",
                self.node_id, self.total_nodes
            )));
        }
        // Every peer needs a port of its own
        let last = NodeId::group_size(self.total_nodes)? - 1;
        self.port_of(NodeId(last))?;
        self.consensus.validate()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<NodeConfig>(&data)?;
        Ok(parsed)
    }
}
