use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use benor_common::Result;
use benor_consensus::{Node, Transport};

use crate::{api::rest::start_rest_api, config::NodeConfig, transport::HttpTransport};

/// A node wired to its HTTP transport, with its listener already bound.
pub struct NodeRuntime {
    pub node: Node,
    pub config: NodeConfig,
    listener: TcpListener,
}

impl NodeRuntime {
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves the REST API until the listener fails.
    pub async fn serve(self) -> Result<()> {
        start_rest_api(self.listener, self.node).await
    }
}

pub async fn build_runtime(config: NodeConfig) -> Result<NodeRuntime> {
    config.validate()?;

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config)?);
    let node = Node::builder(config.node_id, config.total_nodes)
        .with_initial_value(config.initial_value)
        .with_faulty(config.faulty)
        .with_config(config.consensus.clone())
        .with_transport(transport)
        .build()?;

    let port = config.listen_port()?;
    let listener = TcpListener::bind((config.host.as_str(), port)).await?;

    info!(
        "🚀 Node {} ready: initial={}, total={}, majority={}, faulty={}, port={}",
        config.node_id,
        config.initial_value,
        node.total_nodes(),
        node.majority(),
        config.faulty,
        listener.local_addr()?.port()
    );

    Ok(NodeRuntime { node, config, listener })
}
