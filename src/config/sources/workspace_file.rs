//! Workspace config file source: config/config.toml and config/{env}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

/// Environment name from `UPRTCL_ENV`, `development` when unset.
pub fn env_name() -> String {
    std::env::var("UPRTCL_ENV").unwrap_or_else(|_| "development".to_string())
}

/// Add workspace config files to builder.
/// Precedence: config/config.toml (base) then config/{UPRTCL_ENV}.toml.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join("config");

    for path in [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name())),
    ] {
        if path.exists() {
            builder = builder.add_source(File::from(path).required(false));
        }
    }

    Ok(builder)
}
