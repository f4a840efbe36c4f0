//! batchmetrics CLI Binary
//!
//! Emits one measurement per invocation through the configured provider.

use batchmetrics::cli::{Cli, RunContext};
use batchmetrics::logging::{init_logging, LoggingConfig};
use clap::Parser;
use std::process;
use tracing::{debug, error};

fn main() {
    let cli = Cli::parse();

    // Logging is not installed yet, so a load failure goes straight to stderr.
    let config = match RunContext::load_config(&cli.root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", batchmetrics::cli::map_error(&e));
            process::exit(1);
        }
    };

    let logging_config = build_logging_config(&cli, config.logging.clone());
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let context = RunContext::with_config(config, cli.dry_run);
    debug!("CLI context initialized");

    match context.execute(&cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", batchmetrics::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Apply CLI logging flags on top of the loaded logging configuration.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, mut config: LoggingConfig) -> LoggingConfig {
    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
