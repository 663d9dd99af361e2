//! Configuration management
//!
//! Handles:
//! - Remote service location and transport timeout
//! - Poll interval and jitter
//! - Identity file location
//! - Default log filter

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_ENV: &str = "UNICAST_CONFIG";
pub const BACKEND_URL_ENV: &str = "UNICAST_BACKEND_URL";
pub const POLL_INTERVAL_ENV: &str = "UNICAST_POLL_INTERVAL_SECS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub service: ServiceConfig,
    pub polling: PollingConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    /// `None` keeps the transport's default
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub jitter_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://unicasttranslations.onrender.com".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            jitter_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "unicast_client=info".to_string(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

impl ClientConfig {
    /// Load config from `$UNICAST_CONFIG` or the OS-specific location, then apply env overrides
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Invalid config file {}", config_path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save config to the location `load` reads from
    pub async fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_file_path()?;

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_path, content).await?;
        Ok(config_path)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.service.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            self.polling.interval_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{POLL_INTERVAL_ENV} must be a whole number of seconds"))?;
        }
        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(explicit));
        }

        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        path.push("unicast");
        path.push("config.toml");
        Ok(path)
    }

    /// Where the device token and language are persisted
    pub fn identity_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.identity.state_file {
            return Ok(path.clone());
        }

        let mut path = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find local data directory"))?;

        path.push("unicast");
        path.push("identity.toml");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.service.base_url, "https://unicasttranslations.onrender.com");
        assert_eq!(config.polling.interval(), Duration::from_secs(5));
        assert_eq!(config.polling.max_jitter(), Duration::ZERO);
        assert!(config.service.timeout_secs.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            [polling]
            jitter_ms = 750

            [identity]
            state_file = "/tmp/unicast/identity.toml"
            "#,
        )
        .unwrap();
        assert_eq!(config.polling.interval_secs, 5);
        assert_eq!(config.polling.jitter_ms, 750);
        assert_eq!(
            config.identity_file_path().unwrap(),
            PathBuf::from("/tmp/unicast/identity.toml")
        );
        assert_eq!(config.logging.filter, "unicast_client=info");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        config
            .apply_env_overrides(|key| match key {
                BACKEND_URL_ENV => Some("http://localhost:8000".to_string()),
                POLL_INTERVAL_ENV => Some(" 12 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.polling.interval_secs, 12);

        let mut config = ClientConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == POLL_INTERVAL_ENV).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let polling = PollingConfig { interval_secs: 0, jitter_ms: 0 };
        assert_eq!(polling.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = ClientConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(ClientConfig::from_toml(&text).unwrap(), config);
    }
}
