use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{HarnessError, Result};

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/harness.yaml";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HarnessConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub server: ServerConfig,
    pub workload: WorkloadConfig,
    pub network: NetworkConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WorkloadConfig {
    pub table_amount: u32,
    pub item_amount: u32,
    pub worker_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FramingKind {
    /// A read shorter than `read_capacity` ends the response.
    ShortRead,
    /// Every message carries a 4-byte big-endian length prefix.
    LengthPrefixed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    /// Unset means reads block until the server answers.
    pub read_timeout_ms: Option<u64>,
    pub framing: FramingKind,
    pub read_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            log_file: "harness.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
            server: ServerConfig::default(),
            workload: WorkloadConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            table_amount: 100,
            item_amount: 20,
            worker_count: 10,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: None,
            framing: FramingKind::ShortRead,
            read_capacity: 512,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl NetworkConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

impl HarnessConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: HarnessConfig =
            serde_yaml::from_str(&content).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config/harness.yaml` if it exists, built-in defaults otherwise.
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply the positional `[host] [port]` pair from the command line.
    pub fn with_server(mut self, host: &str, port: &str) -> Result<Self> {
        let port = port
            .parse::<u16>()
            .map_err(|_| HarnessError::Config(format!("invalid port: {}", port)))?;
        self.server.host = host.to_string();
        self.server.port = port;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let w = &self.workload;
        if w.table_amount == 0 || w.item_amount == 0 || w.worker_count == 0 {
            return Err(HarnessError::Config(
                "table_amount, item_amount and worker_count must be at least 1".to_string(),
            ));
        }
        if w.item_amount.checked_mul(w.worker_count).is_none() {
            return Err(HarnessError::Config(
                "item_amount * worker_count overflows the item id range".to_string(),
            ));
        }
        if self.network.read_capacity == 0 {
            return Err(HarnessError::Config(
                "read_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
