use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "globeping.json";

/// Tunables for the backend protocol client. Every field has a compiled
/// default so the config file is optional; when `globeping.json` exists in
/// the working directory it overrides whichever fields it names.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    #[serde(default = "default_submit_attempts")]
    pub submit_attempts: u32,
    #[serde(default = "default_submit_backoff_ms")]
    pub submit_backoff_ms: u64,
}

fn default_base_url() -> String {
    "https://check-host.net".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_max_wait_ms() -> u64 {
    30_000
}

fn default_submit_attempts() -> u32 {
    3
}

fn default_submit_backoff_ms() -> u64 {
    2_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_ms: default_max_wait_ms(),
            submit_attempts: default_submit_attempts(),
            submit_backoff_ms: default_submit_backoff_ms(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", CONFIG_FILE)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", CONFIG_FILE)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn submit_backoff(&self) -> Duration {
        Duration::from_millis(self.submit_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_backend_cadence() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://check-host.net");
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.poll_interval_ms, 10_000);
        assert_eq!(config.max_wait_ms, 30_000);
        assert_eq!(config.submit_attempts, 3);
        assert_eq!(config.submit_backoff_ms, 2_000);
    }

    #[test]
    fn partial_config_files_keep_the_remaining_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:9000"}"#).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.poll_interval_ms, 10_000);
        assert_eq!(config.submit_attempts, 3);
    }
}
