//! Logging System
//!
//! Structured logging on top of `tracing`. Level, format and destination come from the
//! configuration file and can be overridden with `UPRTCL_LOG`, `UPRTCL_LOG_FORMAT`,
//! `UPRTCL_LOG_OUTPUT` and `UPRTCL_LOG_MODULES`.

use crate::error::VcError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = VcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(VcError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Log destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl FromStr for LogOutput {
    type Err = VcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            other => Err(VcError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_format")]
    pub format: LogFormat,

    #[serde(default = "default_output")]
    pub output: LogOutput,

    /// Log file, used when `output = "file"`
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// ANSI colors for text output on a terminal
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `uprtcl::cache = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> LogFormat {
    LogFormat::Text
}

fn default_output() -> LogOutput {
    LogOutput::Stderr
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Default log file under the platform data directory
pub fn default_log_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "uprtcl")
        .map(|dirs| dirs.data_dir().join("uprtcl.log"))
        .unwrap_or_else(|| PathBuf::from(".uprtcl/uprtcl.log"))
}

/// Initialize the global subscriber.
///
/// Priority (highest first): environment variables, configuration, defaults.
/// Fails if a subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), VcError> {
    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let color = config.map(|c| c.color).unwrap_or(true) && output != LogOutput::File;

    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File => BoxMakeWriter::new(std::sync::Mutex::new(open_log_file(config)?)),
    };

    let subscriber = Registry::default().with(filter);
    let result = match format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(color)
                    .with_writer(writer),
            )
            .try_init(),
    };

    result.map_err(|e| VcError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn open_log_file(config: Option<&LoggingConfig>) -> Result<std::fs::File, VcError> {
    let path = config
        .and_then(|c| c.file.clone())
        .unwrap_or_else(default_log_file);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            VcError::ConfigError(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| VcError::ConfigError(format!("Failed to open log file {:?}: {}", path, e)))
}

/// Filter from `UPRTCL_LOG`, falling back to configuration plus `UPRTCL_LOG_MODULES`
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, VcError> {
    if let Ok(filter) = EnvFilter::try_from_env("UPRTCL_LOG") {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut directives: Vec<String> = Vec::new();
    if let Some(config) = config {
        directives.extend(
            config
                .modules
                .iter()
                .map(|(module, level)| format!("{}={}", module, level)),
        );
    }
    if let Ok(modules) = std::env::var("UPRTCL_LOG_MODULES") {
        directives.extend(parse_module_directives(&modules));
    }

    let mut filter = EnvFilter::new(level);
    for directive in directives {
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| VcError::ConfigError(format!("Invalid log directive: {}", e)))?,
        );
    }
    Ok(filter)
}

/// `a=debug, b=warn` -> `["a=debug", "b=warn"]`; malformed entries are skipped
fn parse_module_directives(spec: &str) -> Vec<String> {
    spec.split(',')
        .filter_map(|entry| {
            let (module, level) = entry.split_once('=')?;
            let (module, level) = (module.trim(), level.trim());
            (!module.is_empty() && !level.is_empty()).then(|| format!("{}={}", module, level))
        })
        .collect()
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<LogFormat, VcError> {
    if let Ok(format) = std::env::var("UPRTCL_LOG_FORMAT") {
        return format.parse();
    }
    Ok(config.map(|c| c.format).unwrap_or(LogFormat::Text))
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<LogOutput, VcError> {
    if let Ok(output) = std::env::var("UPRTCL_LOG_OUTPUT") {
        return output.parse();
    }
    Ok(config.map(|c| c.output).unwrap_or(LogOutput::Stderr))
}
