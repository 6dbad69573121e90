use serde::{Deserialize, Serialize};

use crate::error::{BenOrError, Result};

/// Identity of a node in the consensus group.
///
/// Identities are dense integers in `[0, total_nodes)`, assigned at
/// construction and never changed. On the wire a `NodeId` is a bare number.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of this node in a `[0, total_nodes)` table.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks that every member of a `total_nodes` group gets an identity.
    pub fn group_size(total_nodes: usize) -> Result<u32> {
        u32::try_from(total_nodes).map_err(|_| {
            BenOrError::Config(format!("total_nodes {} exceeds {}", total_nodes, u32::MAX))
        })
    }

    /// Iterates every identity of a group with `total_nodes` members.
    /// Groups larger than [`group_size`](NodeId::group_size) accepts are
    /// truncated.
    pub fn all(total_nodes: usize) -> impl Iterator<Item = NodeId> {
        (0..u32::try_from(total_nodes).unwrap_or(u32::MAX)).map(NodeId)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}
