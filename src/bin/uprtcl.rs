//! uprtcl CLI Binary
//!
//! Command-line interface over a local sled replica.

use clap::Parser;
use std::process;
use tracing::{error, info};
use uprtcl::cli::{Cli, RunContext};
use uprtcl::config::ConfigLoader;
use uprtcl::logging::{init_logging, LogFormat, LogOutput, LoggingConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging_config = match build_logging_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("uprtcl CLI starting");

    let context = match RunContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error opening store: {}", e);
            eprintln!("{}", uprtcl::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command).await {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", uprtcl::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Precedence: CLI flags over the config file over defaults
fn build_logging_config(cli: &Cli) -> anyhow::Result<LoggingConfig> {
    let loaded = match &cli.config {
        Some(path) => ConfigLoader::load_file(path),
        None => ConfigLoader::load(&cli.workspace),
    };
    let mut config = loaded.map(|c| c.logging).unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(level) = &cli.log_level {
        config.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.format = format.parse::<LogFormat>()?;
    }
    if let Some(output) = &cli.log_output {
        config.output = output.parse::<LogOutput>()?;
    }
    if let Some(file) = &cli.log_file {
        anyhow::ensure!(
            !file.as_os_str().is_empty(),
            "--log-file cannot be empty"
        );
        config.file = Some(file.clone());
        if cli.log_output.is_none() {
            config.output = LogOutput::File;
        }
    }
    Ok(config)
}
