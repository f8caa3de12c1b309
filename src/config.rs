//! Configuration System
//!
//! Layered configuration: built-in defaults, the global file, workspace files, then
//! `UPRTCL__*` style environment variables. The result is validated as a whole and every
//! problem is reported at once.

use crate::consistency::ReadPolicy;
use crate::error::VcError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UprtclConfig {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub consistency: ConsistencyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity used as the author of every record and pointer update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_creator_id")]
    pub creator_id: String,
}

fn default_creator_id() -> String {
    "anonymous".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            creator_id: default_creator_id(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Sled,
}

/// Replica backing the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Sled directory; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_store_path)
    }
}

/// `$XDG_DATA_HOME/uprtcl/store` or the platform equivalent
pub fn default_store_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "uprtcl")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| PathBuf::from(".uprtcl/store"))
}

/// Bounded re-read budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Wall-clock cap across all attempts of one read
    #[serde(default)]
    pub budget_ms: Option<u64>,
}

fn default_max_attempts() -> u32 {
    8
}

fn default_initial_backoff_ms() -> u64 {
    10
}

fn default_max_backoff_ms() -> u64 {
    250
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            budget_ms: None,
        }
    }
}

impl From<&ConsistencyConfig> for ReadPolicy {
    fn from(config: &ConsistencyConfig) -> Self {
        ReadPolicy {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            budget: config.budget_ms.map(Duration::from_millis),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Agent(String),
    Storage(String),
    Consistency(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Agent(msg) => write!(f, "Agent: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Consistency(msg) => write!(f, "Consistency: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl UprtclConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.agent.creator_id.trim().is_empty() {
            errors.push(ValidationError::Agent(
                "creator_id cannot be empty".to_string(),
            ));
        }

        if let Some(path) = &self.storage.path {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Storage(
                    "path cannot be empty".to_string(),
                ));
            }
        }

        let consistency = &self.consistency;
        if consistency.max_attempts == 0 {
            errors.push(ValidationError::Consistency(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if consistency.initial_backoff_ms > consistency.max_backoff_ms {
            errors.push(ValidationError::Consistency(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                consistency.initial_backoff_ms, consistency.max_backoff_ms
            )));
        }
        if consistency.budget_ms == Some(0) {
            errors.push(ValidationError::Consistency(
                "budget_ms must be positive when set".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn read_policy(&self) -> ReadPolicy {
        ReadPolicy::from(&self.consistency)
    }
}

/// Loads configuration from every source in precedence order
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration for a workspace
    pub fn load(workspace_root: &Path) -> Result<UprtclConfig, VcError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);

        let config: UprtclConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            VcError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(config)
    }

    /// Load from a single file on top of the defaults, skipping other sources
    pub fn load_file(path: &Path) -> Result<UprtclConfig, VcError> {
        let path = path.to_str().ok_or_else(|| {
            VcError::ConfigError(format!("Config path is not valid UTF-8: {:?}", path))
        })?;
        let config: UprtclConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::with_name(path).required(true))
            .build()?
            .try_deserialize()?;
        config
            .validate()
            .map_err(|errors| VcError::ConfigError(errors[0].to_string()))?;
        Ok(config)
    }
}
