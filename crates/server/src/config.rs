use coordinator::{CoordinatorConfig, MAX_TIMEOUT, MIN_POLL_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "shard-coordinator.toml";

/// Configuration for the coordinator service, stored as TOML.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub coordinator: CoordinatorSettings,
    pub fulfillment: FulfillmentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection string; the file is created when missing.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:shard-coordinator.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub duplicate_check: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        let defaults = CoordinatorConfig::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
            duplicate_check: defaults.duplicate_check,
        }
    }
}

/// In-process stand-in for the cluster's hook consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FulfillmentConfig {
    pub local: bool,
    /// Artificial delay before the local fulfiller registers a resource.
    pub delay_ms: u64,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            local: true,
            delay_ms: 0,
        }
    }
}

impl FulfillmentConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl AppConfig {
    /// Read config from `path`, falling back to defaults when it is missing
    /// or can not be parsed.
    pub async fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path).await {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    pub async fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(path, content).await?;
        debug!(path = %path.display(), "Config saved successfully");

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Coordinator tunables, with out-of-range values clamped.
    pub fn to_coordinator_config(&self) -> CoordinatorConfig {
        let timeout = Duration::from_secs(self.coordinator.timeout_secs);
        let poll_interval = Duration::from_millis(self.coordinator.poll_interval_ms);

        if timeout > MAX_TIMEOUT {
            warn!(
                timeout_secs = self.coordinator.timeout_secs,
                max_secs = MAX_TIMEOUT.as_secs(),
                "timeout_secs too large, clamping"
            );
        }
        if poll_interval < MIN_POLL_INTERVAL {
            warn!(
                poll_interval_ms = self.coordinator.poll_interval_ms,
                min_ms = MIN_POLL_INTERVAL.as_millis() as u64,
                "poll_interval_ms too small, clamping"
            );
        }

        CoordinatorConfig::new()
            .with_timeout(timeout)
            .with_poll_interval(poll_interval)
            .with_duplicate_check(self.coordinator.duplicate_check)
    }
}
