use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use benor_common::{BenOrError, ConsensusMessage, NodeId, Result, TransportError};
use benor_consensus::Transport;

use crate::{api::rest::ApiResponse, config::NodeConfig};

/// Delivers messages by POSTing them to `http://host:(base_port + id)/message`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    host: String,
    base_port: u16,
}

impl HttpTransport {
    pub fn new(host: impl Into<String>, base_port: u16, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BenOrError::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            host: host.into(),
            base_port,
        })
    }

    /// Requests are bounded by the collection timeout.
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        Self::new(config.host.clone(), config.base_port, config.consensus.collect_timeout())
    }

    pub fn peer_url(&self, peer: NodeId) -> String {
        let port = u32::from(self.base_port) + peer.0;
        format!("http://{}:{}/message", self.host, port)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, to: NodeId, message: ConsensusMessage) -> std::result::Result<(), TransportError> {
        let response = self
            .client
            .post(self.peer_url(to))
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TransportError::Unreachable(to)
                } else {
                    TransportError::Send(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        if status == StatusCode::BAD_REQUEST {
            if let Ok(ApiResponse { reason: Some(reason), .. }) = response.json::<ApiResponse>().await {
                return Err(TransportError::Rejected(to, reason));
            }
        }
        Err(TransportError::Send(format!("node {} answered {}", to, status)))
    }
}
