//! Global config file source: $XDG_CONFIG_HOME/uprtcl/config.toml or ~/.config/uprtcl/config.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::PathBuf;
use tracing::debug;

/// Path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".config")))?;
    Some(base.join("uprtcl").join("config.toml"))
}

/// Add the global config file to the builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_config_path() else {
        return Ok(builder);
    };
    if !path.exists() {
        debug!(config_path = %path.display(), "No global configuration file");
        return Ok(builder);
    }
    Ok(builder.add_source(File::from(path).required(false)))
}
