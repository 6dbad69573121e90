use std::time::Duration;

use serde::{Deserialize, Serialize};

use benor_common::{BenOrError, Result};

/// Tuning knobs of the round loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Upper bound for each collection phase, in milliseconds. A phase ends
    /// earlier once every node of the group has been heard from.
    pub collect_timeout_ms: u64,

    /// Forces a decision after this many rounds without one. Disabled by
    /// default: a forced decision can break validity.
    pub max_rounds: Option<u64>,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            collect_timeout_ms: 1000,
            max_rounds: None,
        }
    }
}

impl ConsensusConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.collect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<u64>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_millis(self.collect_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.collect_timeout_ms == 0 {
            return Err(BenOrError::Config("collect_timeout_ms must be greater than zero".into()));
        }
        if self.max_rounds == Some(0) {
            return Err(BenOrError::Config("max_rounds must be at least 1 when set".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsensusConfig::default();
        assert_eq!(config.collect_timeout(), Duration::from_secs(1));
        assert_eq!(config.max_rounds, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_timeout = ConsensusConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(zero_timeout.validate(), Err(BenOrError::Config(_))));

        let zero_rounds = ConsensusConfig::default().with_max_rounds(Some(0));
        assert!(matches!(zero_rounds.validate(), Err(BenOrError::Config(_))));
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = ConsensusConfig::default().with_timeout(Duration::MAX);
        assert_eq!(config.collect_timeout_ms, u64::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ConsensusConfig = serde_json::from_str(r#"{"max_rounds": 5}"#).unwrap();
        assert_eq!(config.collect_timeout_ms, 1000);
        assert_eq!(config.max_rounds, Some(5));
    }
}
