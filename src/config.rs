use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Free-list size per event kind unless configured otherwise.
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// Environment variable naming a YAML pool configuration file.
pub const CONFIG_ENV: &str = "SYNTHETIC_EVENTS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read pool config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Free-list size for kinds without an entry in `capacities`.
    pub capacity: usize,
    /// Per-kind overrides, keyed by interface name.
    pub capacities: HashMap<String, usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            capacities: HashMap::new(),
        }
    }
}

impl PoolConfig {
    /// Load from `config_path`, falling back to defaults when no path is
    /// given or the file does not exist.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                Ok(serde_yaml::from_str(&contents)?)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_kind_capacity(mut self, kind: impl Into<String>, capacity: usize) -> Self {
        self.capacities.insert(kind.into(), capacity);
        self
    }

    pub fn capacity_for(&self, kind: &str) -> usize {
        self.capacities.get(kind).copied().unwrap_or(self.capacity)
    }
}
