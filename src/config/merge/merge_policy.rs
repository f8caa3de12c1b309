//! Merge rules: defaults, override order.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("agent.creator_id", "anonymous")?
        .set_default("storage.backend", "sled")?
        .set_default("consistency.max_attempts", 8)?
        .set_default("consistency.initial_backoff_ms", 10)?
        .set_default("consistency.max_backoff_ms", 250)?
        .set_default("logging.level", "info")
}
