//! CLI parse: clap types for batchmetrics. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// batchmetrics CLI - emit measurements to a telemetry backend
#[derive(Parser)]
#[command(name = "batchmetrics")]
#[command(about = "Emit gauges, counters and timings to a telemetry backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root; config/config.toml is read from here
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print encoded requests instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report the value of a metric at this point in time
    Gauge {
        name: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
        #[command(flatten)]
        tags: TagArgs,
    },
    /// Report how many times something happened
    Count {
        name: String,
        #[arg(allow_negative_numbers = true)]
        value: i64,
        #[command(flatten)]
        tags: TagArgs,
    },
    /// Count of +1
    Incr {
        name: String,
        #[command(flatten)]
        tags: TagArgs,
    },
    /// Count of -1
    Decr {
        name: String,
        #[command(flatten)]
        tags: TagArgs,
    },
    /// Report a duration, given in milliseconds
    Timing {
        name: String,
        #[arg(value_name = "MILLIS", value_parser = parse_millis)]
        duration: Duration,
        #[command(flatten)]
        tags: TagArgs,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML (credentials masked)
    Show,
    /// Validate the effective configuration
    Validate,
}

#[derive(Args, Clone, Debug, Default)]
pub struct TagArgs {
    /// Tag as key=value; repeatable
    #[arg(long = "tag", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid tag '{}': expected key=value", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid tag '{}': key cannot be empty", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_millis(raw: &str) -> Result<Duration, String> {
    let millis: f64 = raw
        .parse()
        .map_err(|_| format!("invalid duration '{}': expected milliseconds", raw))?;
    if !millis.is_finite() || millis < 0.0 {
        return Err(format!(
            "invalid duration '{}': must be a finite, non-negative number of milliseconds",
            raw
        ));
    }
    Duration::try_from_secs_f64(millis / 1000.0)
        .map_err(|e| format!("invalid duration '{}': {}", raw, e))
}
