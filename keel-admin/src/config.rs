use crate::errors::{AdminError, Result};

use keel_core::{Endpoint, SocketSetting};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Replaces the configured name server list, comma separated `host:port`.
pub const NAME_SERVERS_ENV: &str = "KEEL_NAME_SERVERS";

/// configuration settings of the admin control plane, loaded from a YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Directory servers ("name servers") tracking the clusters
    pub name_servers: Vec<Endpoint>,
    /// Transport settings for directory and broker connections
    #[serde(default)]
    pub socket: SocketSetting,
    /// Timeout applied to every request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Accumulated message monitoring
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Periodic scan for topics with too many unconsumed messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    pub scan_interval_seconds: u64,
    /// Topics whose backlog exceeds this count are reported
    pub accumulate_threshold: u64,
    pub initial_delay_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scan_interval_seconds: 60,
            accumulate_threshold: 10_000,
            initial_delay_ms: 1000,
        }
    }
}

impl MonitorConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_seconds)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl AdminConfig {
    pub fn new(name_servers: Vec<Endpoint>) -> Self {
        AdminConfig {
            name_servers,
            socket: SocketSetting::default(),
            request_timeout_ms: default_request_timeout_ms(),
            monitor: MonitorConfig::default(),
        }
    }

    /// Reads the YAML file at `path`, applies the environment override and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdminError::Config(format!("unable to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&content)?;
        if let Ok(list) = std::env::var(NAME_SERVERS_ENV) {
            config.name_servers = parse_name_servers(&list)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| AdminError::Config(format!("invalid configuration: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name_servers.is_empty() {
            return Err(AdminError::Config(
                "at least one name server must be configured".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(AdminError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.monitor.enabled && self.monitor.scan_interval_seconds == 0 {
            return Err(AdminError::Config(
                "monitor.scan_interval_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Parses a comma separated `host:port` list, ignoring blank entries.
pub fn parse_name_servers(list: &str) -> Result<Vec<Endpoint>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Endpoint>()
                .map_err(|e| AdminError::Config(e.to_string()))
        })
        .collect()
}
