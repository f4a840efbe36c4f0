//! Stackdriver (Cloud Monitoring v3) backend: one time series per event,
//! written through the REST `timeSeries.create` method.

use super::encoding::{checked_value, metric_identifier, CheckedValue};
use super::Provider;
use crate::error::MetricsError;
use crate::event::{Event, Tags};
use crate::transport::{Transport, TransportRequest};
use chrono::SecondsFormat;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub const STACKDRIVER_DEFAULT_ENDPOINT: &str = "https://monitoring.googleapis.com";

/// Maximum time series accepted by a single create request.
pub const STACKDRIVER_MAX_BATCH_SIZE: usize = 200;

const METRIC_PREFIX: &str = "custom.googleapis.com/";
const BACKEND: &str = "stackdriver";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTimeSeriesRequest<'a> {
    time_series: Vec<TimeSeries<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeSeries<'a> {
    metric: Metric<'a>,
    resource: MonitoredResource,
    metric_kind: &'static str,
    value_type: &'static str,
    points: Vec<Point>,
}

#[derive(Debug, Serialize)]
struct Metric<'a> {
    #[serde(rename = "type")]
    metric_type: String,
    #[serde(skip_serializing_if = "no_labels")]
    labels: &'a Tags,
}

fn no_labels(labels: &&Tags) -> bool {
    labels.is_empty()
}

#[derive(Debug, Serialize)]
struct MonitoredResource {
    #[serde(rename = "type")]
    resource_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Point {
    interval: TimeInterval,
    value: TypedValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeInterval {
    start_time: String,
    end_time: String,
}

/// int64 values travel as decimal strings in the REST JSON mapping.
#[derive(Debug, Serialize)]
enum TypedValue {
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "int64Value")]
    Int64(String),
}

/// Writes each event as its own single-point time series.
///
/// Events are not aggregated. Two events in one batch with the same name and
/// tags become two entries for the same series in one `timeSeries.create`
/// request, which Cloud Monitoring rejects as a whole. Callers reporting the
/// same series many times per flush should aggregate before reporting. Such
/// batches are still sent, and a warning names how many entries repeat.
pub struct StackdriverProvider {
    project_id: String,
    endpoint: String,
    access_token: Option<String>,
    transport: Arc<dyn Transport>,
}

impl StackdriverProvider {
    pub fn new(
        project_id: String,
        access_token: Option<String>,
        endpoint: Option<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            project_id,
            endpoint: endpoint.unwrap_or_else(|| STACKDRIVER_DEFAULT_ENDPOINT.to_string()),
            access_token,
            transport,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn url(&self) -> String {
        format!(
            "{}/v3/projects/{}/timeSeries",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        )
    }

    /// Encode the whole batch into one request. Fails on the first bad record.
    pub fn encode_batch(&self, batch: &[Event]) -> Result<TransportRequest, MetricsError> {
        let time_series = batch
            .iter()
            .enumerate()
            .map(|(index, event)| encode_time_series(event, index))
            .collect::<Result<Vec<_>, _>>()?;

        let repeated = repeated_series(&time_series);
        if repeated > 0 {
            warn!(
                repeated,
                series = time_series.len(),
                "Batch writes the same time series more than once"
            );
        }

        let body = serde_json::to_vec(&CreateTimeSeriesRequest { time_series }).map_err(
            |source| MetricsError::Encoding {
                backend: BACKEND,
                source,
            },
        )?;

        let mut request = TransportRequest::new(self.url(), "application/json", body);
        if let Some(token) = &self.access_token {
            request = request.with_header("Authorization", format!("Bearer {}", token));
        }
        Ok(request)
    }
}

/// Number of entries whose metric type and labels already appeared earlier in
/// the batch.
fn repeated_series(time_series: &[TimeSeries<'_>]) -> usize {
    let mut seen = HashSet::with_capacity(time_series.len());
    time_series
        .iter()
        .filter(|ts| !seen.insert((ts.metric.metric_type.as_str(), ts.metric.labels)))
        .count()
}

fn encode_time_series(event: &Event, index: usize) -> Result<TimeSeries<'_>, MetricsError> {
    let metric_type = metric_identifier(METRIC_PREFIX, event, index)?;
    let (value_type, value) = match checked_value(event, index)? {
        CheckedValue::Float(v) => ("DOUBLE", TypedValue::Double(v)),
        CheckedValue::Integer(v) | CheckedValue::Micros(v) => {
            ("INT64", TypedValue::Int64(v.to_string()))
        }
    };

    let time = event.time().to_rfc3339_opts(SecondsFormat::Secs, true);

    Ok(TimeSeries {
        metric: Metric {
            metric_type,
            labels: event.tags(),
        },
        resource: MonitoredResource {
            resource_type: "global",
        },
        metric_kind: "GAUGE",
        value_type,
        points: vec![Point {
            interval: TimeInterval {
                start_time: time.clone(),
                end_time: time,
            },
            value,
        }],
    })
}

impl Provider for StackdriverProvider {
    fn send(&self, batch: &[Event]) -> Result<(), MetricsError> {
        if batch.is_empty() {
            return Ok(());
        }
        let request = self.encode_batch(batch)?;
        debug!(
            series = batch.len(),
            project = %self.project_id,
            "Writing time series to stackdriver"
        );
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
        Some(STACKDRIVER_MAX_BATCH_SIZE)
    }
}
