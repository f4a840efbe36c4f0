//! Configuration System
//!
//! Layered configuration for the client, the provider and logging. Sources
//! are merged by [`ConfigLoader`]; the result is validated as a whole so every
//! problem is reported at once.

use crate::client::DEFAULT_MAX_BUFFER_SIZE;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

pub use crate::provider::ProviderConfig;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub client: ClientConfig,

    /// Backend the client sends to
    #[serde(default)]
    pub provider: Option<ProviderConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Client buffering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Number of buffered events that triggers a flush
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

fn default_max_buffer_size() -> usize {
    DEFAULT_MAX_BUFFER_SIZE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: default_max_buffer_size(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_buffer_size == 0 {
            return Err("max_buffer_size must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Client(String),
    Provider(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Client(msg) => write!(f, "Client: {}", msg),
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl MetricsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.client.validate() {
            errors.push(ValidationError::Client(e));
        }

        if let Some(provider) = &self.provider {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(
                    provider.backend_name().to_string(),
                    e,
                ));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Copy with provider credentials masked, for display.
    pub fn masked(&self) -> Self {
        Self {
            provider: self.provider.as_ref().map(ProviderConfig::masked),
            ..self.clone()
        }
    }
}
