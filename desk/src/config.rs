//! TOML configuration loading and validation.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the trading backend, e.g. `https://api.example.test`.
    pub base_url: String,
    /// WebSocket URL of the price feed, e.g. `wss://api.example.test/feed`.
    pub ws_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Cadence of the market-data poll (order book, trades, orders, balances).
    #[serde(default = "default_data_poll")]
    pub data_poll_ms: u64,
    /// Cadence of the reference-price poll. Runs regardless of socket state.
    #[serde(default = "default_price_poll")]
    pub price_poll_ms: u64,
    /// Delay between a successful initial price fetch and the one socket
    /// connection attempt.
    #[serde(default = "default_settle")]
    pub socket_settle_ms: u64,
    /// How many recent trades to request per tick.
    #[serde(default = "default_trade_limit")]
    pub trade_tape_limit: usize,
}

fn default_data_poll() -> u64 {
    5_000
}
fn default_price_poll() -> u64 {
    30_000
}
fn default_settle() -> u64 {
    2_000
}
fn default_trade_limit() -> usize {
    50
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_poll_ms: default_data_poll(),
            price_poll_ms: default_price_poll(),
            socket_settle_ms: default_settle(),
            trade_tape_limit: default_trade_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// How long the post-execution success flag stays visible.
    #[serde(default = "default_flash")]
    pub success_flash_ms: u64,
}

fn default_flash() -> u64 {
    3_000
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            success_flash_ms: default_flash(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        if !self.connection.base_url.starts_with("http") {
            return Err(Error::Config("base_url must be an http(s) URL".into()));
        }
        if !self.connection.ws_url.starts_with("ws") {
            return Err(Error::Config("ws_url must be a ws(s) URL".into()));
        }
        if self.connection.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be > 0".into()));
        }
        if self.sync.data_poll_ms == 0 {
            return Err(Error::Config("data_poll_ms must be > 0".into()));
        }
        if self.sync.price_poll_ms == 0 {
            return Err(Error::Config("price_poll_ms must be > 0".into()));
        }
        if self.sync.trade_tape_limit == 0 {
            return Err(Error::Config("trade_tape_limit must be > 0".into()));
        }
        Ok(())
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.request_timeout_secs)
    }

    /// Market-data poll interval.
    pub fn data_poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync.data_poll_ms)
    }

    /// Reference-price poll interval.
    pub fn price_poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync.price_poll_ms)
    }

    /// Socket settle delay after the initial price fetch.
    pub fn socket_settle_delay(&self) -> Duration {
        Duration::from_millis(self.sync.socket_settle_ms)
    }

    /// Success flash duration.
    pub fn success_flash(&self) -> Duration {
        Duration::from_millis(self.ui.success_flash_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[connection]
base_url = "https://api.example.test"
ws_url = "wss://api.example.test/feed"
request_timeout_secs = 10

[sync]
data_poll_ms = 5000
price_poll_ms = 30000
socket_settle_ms = 2000
trade_tape_limit = 50

[ui]
success_flash_ms = 3000
"#
    }

    #[test]
    fn parse_example_config() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.connection.base_url, "https://api.example.test");
        assert_eq!(config.sync.data_poll_ms, 5000);
        assert_eq!(config.sync.price_poll_ms, 30000);
        assert_eq!(config.ui.success_flash_ms, 3000);
        config.validate().unwrap();
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[connection]
base_url = "http://localhost:8080"
ws_url = "ws://localhost:8080/feed"
"#,
        )
        .unwrap();
        assert_eq!(config.connection.request_timeout_secs, 10);
        assert_eq!(config.sync.data_poll_ms, 5_000);
        assert_eq!(config.sync.price_poll_ms, 30_000);
        assert_eq!(config.sync.socket_settle_ms, 2_000);
        assert_eq!(config.sync.trade_tape_limit, 50);
        assert_eq!(config.ui.success_flash_ms, 3_000);
        config.validate().unwrap();
    }

    #[test]
    fn validate_catches_bad_base_url() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.connection.base_url = "ftp://example".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_bad_ws_url() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.connection.ws_url = "https://example".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_zero_poll() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.sync.data_poll_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn durations() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.data_poll_interval(), Duration::from_secs(5));
        assert_eq!(config.price_poll_interval(), Duration::from_secs(30));
        assert_eq!(config.socket_settle_delay(), Duration::from_secs(2));
        assert_eq!(config.success_flash(), Duration::from_secs(3));
    }
}
