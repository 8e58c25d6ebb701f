//! Configuration for pagebd clients.

use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Storage account whose page blobs back the disks.
    pub account_name: String,
    /// Base64-encoded storage account key.
    pub account_key: String,
    /// Device node exposing the driver's control channel.
    #[serde(default = "default_device_path")]
    pub device: PathBuf,
    /// Upper bound on a single command exchange.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_device_path() -> PathBuf {
    PathBuf::from("/dev/pagebd")
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl ClientConfig {
    pub fn new(account_name: impl Into<String>, account_key: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: account_key.into(),
            device: default_device_path(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: ClientConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "account_name",
                reason: "must be non-empty",
            });
        }
        if BASE64.decode(&self.account_key).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "account_key",
                reason: "must be base64",
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be > 0",
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            account_name = "acct"
            account_key = "c2VjcmV0"
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.device, PathBuf::from("/dev/pagebd"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_empty_account_name() {
        let config = ClientConfig::new("", "c2VjcmV0");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "account_name",
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_base64_key() {
        let config = ClientConfig::new("acct", "not-base64!!");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "account_key",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = ClientConfig::new("acct", "c2VjcmV0");
        config.timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
