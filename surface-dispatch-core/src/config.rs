//! Per-surface configuration

use std::time::Duration;

use serde::Deserialize;

use crate::logging::ActionLoggerConfig;

fn default_poll_interval_ms() -> u64 {
    15_000
}

fn default_persist() -> bool {
    true
}

/// Configuration of one mounted surface.
///
/// Every field has a default, so `{}` and `{"name": "wallet-panel"}` are
/// both valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default)]
    pub name: String,

    /// Durable storage key. Defaults to `persist:<name>`.
    #[serde(default)]
    storage_key: Option<String>,

    /// Balance and gas estimate refresh interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Whether allow-listed state is written to storage.
    #[serde(default = "default_persist")]
    pub persist: bool,

    #[serde(default)]
    pub log: ActionLoggerConfig,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::named("surface")
    }
}

impl SurfaceConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_key: None,
            poll_interval_ms: default_poll_interval_ms(),
            persist: default_persist(),
            log: ActionLoggerConfig::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn storage_key(&self) -> String {
        self.storage_key
            .clone()
            .unwrap_or_else(|| format!("persist:{}", self.name))
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = SurfaceConfig::from_json(r#"{"name":"wallet-panel"}"#).unwrap();
        assert_eq!(config.storage_key(), "persist:wallet-panel");
        assert_eq!(config.poll_interval(), Duration::from_secs(15));
        assert!(config.persist);
        assert_eq!(config.log, ActionLoggerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = SurfaceConfig::from_json(
            r#"{"name":"wallet-page","storage_key":"page","poll_interval_ms":500,"persist":false,"log":{"exclude":[]}}"#,
        )
        .unwrap();
        assert_eq!(config.storage_key(), "page");
        assert_eq!(config.poll_interval_ms, 500);
        assert!(!config.persist);
        assert!(config.log.should_log("PollTick"));
    }

    #[test]
    fn test_builder() {
        let config = SurfaceConfig::named("panel")
            .with_poll_interval(Duration::from_millis(250))
            .with_storage_key("custom");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.storage_key(), "custom");
    }
}
