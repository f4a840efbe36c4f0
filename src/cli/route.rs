//! CLI route: loads configuration once and dispatches each command.

use super::parse::{Commands, ConfigCommands, TagArgs};
use crate::client::Client;
use crate::config::{ConfigLoader, MetricsConfig};
use crate::error::MetricsError;
use crate::event::{Event, Tags};
use crate::provider::{Backend, Provider};
use crate::transport::{DryRunTransport, HttpTransport, Transport};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Execution context for one CLI invocation.
pub struct RunContext {
    config: MetricsConfig,
    dry_run: bool,
}

impl RunContext {
    /// Load the effective configuration: the explicit file when given,
    /// otherwise the layered sources under `root`.
    pub fn load_config(
        root: &Path,
        config_path: Option<&Path>,
    ) -> Result<MetricsConfig, MetricsError> {
        match config_path {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(root),
        }
    }

    pub fn with_config(config: MetricsConfig, dry_run: bool) -> Self {
        Self { config, dry_run }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, MetricsError> {
        match command {
            Commands::Gauge { name, value, tags } => {
                self.emit(Event::gauge(name.as_str(), *value, collect_tags(tags)))
            }
            Commands::Count { name, value, tags } => {
                self.emit(Event::count(name.as_str(), *value, collect_tags(tags)))
            }
            Commands::Incr { name, tags } => {
                self.emit(Event::count(name.as_str(), 1, collect_tags(tags)))
            }
            Commands::Decr { name, tags } => {
                self.emit(Event::count(name.as_str(), -1, collect_tags(tags)))
            }
            Commands::Timing {
                name,
                duration,
                tags,
            } => self.emit(Event::timing(name.as_str(), *duration, collect_tags(tags))),
            Commands::Config { command } => match command {
                ConfigCommands::Show => self.show_config(),
                ConfigCommands::Validate => self.validate_config(),
            },
        }
    }

    /// Build a client from configuration, report one event and close it.
    fn emit(&self, event: Event) -> Result<String, MetricsError> {
        let provider_config = self.config.provider.as_ref().ok_or_else(|| {
            MetricsError::InvalidConfig("No provider configured".to_string())
        })?;

        let transport: Arc<dyn Transport> = if self.dry_run {
            Arc::new(DryRunTransport::stdout())
        } else {
            Arc::new(
                HttpTransport::new().map_err(|source| MetricsError::Transport {
                    backend: provider_config.backend_name(),
                    source,
                })?,
            )
        };

        let backend = Backend::from_config(provider_config, transport)?;
        let backend_name = backend.name().to_string();
        let client = Client::from_config(backend, &self.config.client)?;

        let kind = event.kind();
        let name = event.name().to_string();
        let sent = client.send(event);
        // close flushes whatever send left buffered; a send error wins
        let closed = client.close();
        sent.and(closed)?;

        info!(metric = %name, kind = %kind, backend = %backend_name, "Metric emitted");
        Ok(format!("Sent {} '{}' to {}", kind, name, backend_name))
    }

    fn show_config(&self) -> Result<String, MetricsError> {
        toml::to_string_pretty(&self.config.masked())
            .map_err(|e| MetricsError::InvalidConfig(format!("Failed to render config: {}", e)))
    }

    fn validate_config(&self) -> Result<String, MetricsError> {
        self.config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            MetricsError::InvalidConfig(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok("Configuration is valid".to_string())
    }
}

fn collect_tags(args: &TagArgs) -> Tags {
    args.tags.iter().cloned().collect()
}
