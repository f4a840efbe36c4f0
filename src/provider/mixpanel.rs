//! Mixpanel backend: events are tracked through the `/track` endpoint as a
//! base64 encoded JSON array.

use super::encoding::{checked_value, metric_identifier, CheckedValue};
use super::Provider;
use crate::error::MetricsError;
use crate::event::Event;
use crate::transport::{Transport, TransportRequest};
use base64::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

pub const MIXPANEL_DEFAULT_ENDPOINT: &str = "https://api.mixpanel.com/track";

/// Maximum events accepted by a single `/track` request.
pub const MIXPANEL_MAX_BATCH_SIZE: usize = 50;

/// Property keys owned by the Mixpanel envelope.
pub const RESERVED_KEYS: [&str; 3] = ["token", "time", "value"];

const BACKEND: &str = "mixpanel";

#[derive(Debug, Serialize)]
struct TrackForm {
    data: String,
}

#[derive(Debug, Serialize)]
struct MixpanelEvent {
    event: String,
    properties: Map<String, Value>,
}

pub struct MixpanelProvider {
    endpoint: String,
    token: String,
    transport: Arc<dyn Transport>,
}

impl MixpanelProvider {
    pub fn new(token: String, endpoint: Option<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: endpoint.unwrap_or_else(|| MIXPANEL_DEFAULT_ENDPOINT.to_string()),
            token,
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Encode the whole batch into one request. Fails on the first bad record.
    pub fn encode_batch(&self, batch: &[Event]) -> Result<TransportRequest, MetricsError> {
        let events = batch
            .iter()
            .enumerate()
            .map(|(index, event)| self.encode_event(event, index))
            .collect::<Result<Vec<_>, _>>()?;

        let json = serde_json::to_vec(&events).map_err(|source| MetricsError::Encoding {
            backend: BACKEND,
            source,
        })?;
        let form = TrackForm {
            data: BASE64_STANDARD.encode(json),
        };
        let body = serde_urlencoded::to_string(&form).map_err(|source| {
            MetricsError::FormEncoding {
                backend: BACKEND,
                source,
            }
        })?;

        Ok(TransportRequest::new(
            self.endpoint.clone(),
            "application/x-www-form-urlencoded",
            body.into_bytes(),
        ))
    }

    fn encode_event(&self, event: &Event, index: usize) -> Result<MixpanelEvent, MetricsError> {
        let name = metric_identifier("", event, index)?;
        let value = match checked_value(event, index)? {
            CheckedValue::Float(v) => Value::from(v),
            CheckedValue::Integer(v) | CheckedValue::Micros(v) => Value::from(v),
        };

        let mut properties = Map::new();
        properties.insert("token".to_string(), Value::from(self.token.as_str()));
        properties.insert("time".to_string(), Value::from(event.time().timestamp()));
        properties.insert("value".to_string(), value);

        for (key, tag_value) in event.tags() {
            if RESERVED_KEYS.contains(&key.as_str()) {
                return Err(MetricsError::ReservedTagKey {
                    backend: BACKEND,
                    metric: event.name().to_string(),
                    index,
                    key: key.clone(),
                });
            }
            properties.insert(key.clone(), Value::from(tag_value.as_str()));
        }

        Ok(MixpanelEvent {
            event: name,
            properties,
        })
    }
}

impl Provider for MixpanelProvider {
    fn send(&self, batch: &[Event]) -> Result<(), MetricsError> {
        if batch.is_empty() {
            return Ok(());
        }
        let request = self.encode_batch(batch)?;
        debug!(events = batch.len(), "Sending batch to mixpanel");
        self.transport
            .send(request)
            .map_err(|source| MetricsError::Transport {
                backend: BACKEND,
                source,
            })
    }

    fn name(&self) -> &str {
        BACKEND
    }

    fn max_batch_size(&self) -> Option<usize> {
        Some(MIXPANEL_MAX_BATCH_SIZE)
    }
}
