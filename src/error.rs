//! Error types for the batchmetrics client.

use crate::event::MetricKind;
use crate::transport::TransportError;
use thiserror::Error;

/// Errors surfaced by the client, the providers and configuration loading.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("client is closed")]
    ClientClosed,

    #[error("client is already closed")]
    AlreadyClosed,

    #[error("record {index} ('{metric}'): cannot specify reserved keyword tag '{key}' for {backend}")]
    ReservedTagKey {
        backend: &'static str,
        metric: String,
        index: usize,
        key: String,
    },

    #[error("record {index}: metric '{metric}' of type {kind} should contain a value of type {expected}, got {found}")]
    TypeMismatch {
        metric: String,
        index: usize,
        kind: MetricKind,
        expected: &'static str,
        found: &'static str,
    },

    #[error("record {index}: metric '{metric}' has non-finite value {value}")]
    NonFiniteValue {
        metric: String,
        index: usize,
        value: f64,
    },

    #[error("unrecognized metric type: {0}")]
    UnrecognizedType(String),

    #[error("record {index}: metric name cannot be empty")]
    EmptyMetricName { index: usize },

    #[error("failed to encode {backend} payload: {source}")]
    Encoding {
        backend: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to form-encode {backend} payload: {source}")]
    FormEncoding {
        backend: &'static str,
        #[source]
        source: serde_urlencoded::ser::Error,
    },

    #[error("error sending events to {backend}: {source}")]
    Transport {
        backend: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

impl From<config::ConfigError> for MetricsError {
    fn from(err: config::ConfigError) -> Self {
        MetricsError::InvalidConfig(err.to_string())
    }
}
