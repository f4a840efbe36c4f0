//! Provider Abstraction
//!
//! A provider accepts batches of [`Event`]s and delivers them to a telemetry
//! backend. The [`Provider`] trait is the seam the client depends on; the
//! shipped backends are enumerated by [`Backend`] and built from a
//! [`ProviderConfig`].

use crate::error::MetricsError;
use crate::event::Event;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod encoding;
pub mod mixpanel;
pub mod stackdriver;

pub use mixpanel::MixpanelProvider;
pub use stackdriver::StackdriverProvider;

/// Backend sink for batches of events.
pub trait Provider: Send + Sync {
    /// Deliver one batch. An empty batch succeeds without any I/O.
    ///
    /// The batch is encoded in full before anything is transmitted; the first
    /// record that fails validation aborts the whole send.
    fn send(&self, batch: &[Event]) -> Result<(), MetricsError>;

    /// Backend name used in logs and errors.
    fn name(&self) -> &str;

    /// Largest batch the backend accepts in one request, if limited.
    fn max_batch_size(&self) -> Option<usize> {
        None
    }
}

impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn send(&self, batch: &[Event]) -> Result<(), MetricsError> {
        (**self).send(batch)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn max_batch_size(&self) -> Option<usize> {
        (**self).max_batch_size()
    }
}

impl<P: Provider + ?Sized> Provider for Box<P> {
    fn send(&self, batch: &[Event]) -> Result<(), MetricsError> {
        (**self).send(batch)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn max_batch_size(&self) -> Option<usize> {
        (**self).max_batch_size()
    }
}

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Mixpanel {
        token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
    Stackdriver {
        project_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_token: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
}

impl ProviderConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            ProviderConfig::Mixpanel { .. } => "mixpanel",
            ProviderConfig::Stackdriver { .. } => "stackdriver",
        }
    }

    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), String> {
        let endpoint = match self {
            ProviderConfig::Mixpanel { token, endpoint } => {
                if token.trim().is_empty() {
                    return Err("Mixpanel token cannot be empty".to_string());
                }
                endpoint
            }
            ProviderConfig::Stackdriver {
                project_id,
                endpoint,
                ..
            } => {
                if project_id.trim().is_empty() {
                    return Err("Stackdriver project_id cannot be empty".to_string());
                }
                endpoint
            }
        };

        if let Some(endpoint) = endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "Invalid endpoint '{}' (must start with http:// or https://)",
                    endpoint
                ));
            }
        }

        Ok(())
    }

    /// Copy with credentials replaced, for display.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        match &mut masked {
            ProviderConfig::Mixpanel { token, .. } => *token = mask(token),
            ProviderConfig::Stackdriver { access_token, .. } => {
                if let Some(token) = access_token.as_mut() {
                    *token = mask(token);
                }
            }
        }
        masked
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "***".to_string()
    }
}

/// The shipped backends.
pub enum Backend {
    Mixpanel(MixpanelProvider),
    Stackdriver(StackdriverProvider),
}

impl Backend {
    /// Build the backend described by `config`, sending through `transport`.
    pub fn from_config(
        config: &ProviderConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, MetricsError> {
        config.validate().map_err(|e| {
            MetricsError::InvalidConfig(format!("Provider '{}': {}", config.backend_name(), e))
        })?;

        Ok(match config {
            ProviderConfig::Mixpanel { token, endpoint } => Backend::Mixpanel(
                MixpanelProvider::new(token.clone(), endpoint.clone(), transport),
            ),
            ProviderConfig::Stackdriver {
                project_id,
                access_token,
                endpoint,
            } => Backend::Stackdriver(StackdriverProvider::new(
                project_id.clone(),
                access_token.clone(),
                endpoint.clone(),
                transport,
            )),
        })
    }
}

impl Provider for Backend {
    fn send(&self, batch: &[Event]) -> Result<(), MetricsError> {
        match self {
            Backend::Mixpanel(p) => p.send(batch),
            Backend::Stackdriver(p) => p.send(batch),
        }
    }

    fn name(&self) -> &str {
        match self {
            Backend::Mixpanel(p) => p.name(),
            Backend::Stackdriver(p) => p.name(),
        }
    }

    fn max_batch_size(&self) -> Option<usize> {
        match self {
            Backend::Mixpanel(p) => p.max_batch_size(),
            Backend::Stackdriver(p) => p.max_batch_size(),
        }
    }
}
