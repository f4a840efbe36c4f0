//! Encoding rules shared by every backend: identifier derivation and
//! kind/value validation.
//!
//! `index` is the position of the event within the batch being encoded, so a
//! validation error points at the first offending record.

use crate::error::MetricsError;
use crate::event::{Event, MetricKind, MetricValue};
use std::time::Duration;

/// Unit suffix appended to Timing metric identifiers.
pub const TIMING_SUFFIX: &str = "_micros";

/// A value that passed validation against its declared kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckedValue {
    Float(f64),
    Integer(i64),
    /// Timing sample in whole microseconds.
    Micros(i64),
}

/// Derive the metric identifier for `event`, prefixed with `prefix`.
pub fn metric_identifier(
    prefix: &str,
    event: &Event,
    index: usize,
) -> Result<String, MetricsError> {
    if event.name().is_empty() {
        return Err(MetricsError::EmptyMetricName { index });
    }
    let mut id = String::with_capacity(prefix.len() + event.name().len() + TIMING_SUFFIX.len());
    id.push_str(prefix);
    id.push_str(event.name());
    if event.kind() == MetricKind::Timing {
        id.push_str(TIMING_SUFFIX);
    }
    Ok(id)
}

/// Check the runtime value type against the declared kind.
///
/// Gauges must be finite; JSON has no representation for NaN or infinity.
pub fn checked_value(event: &Event, index: usize) -> Result<CheckedValue, MetricsError> {
    match (event.kind(), event.value()) {
        (MetricKind::Gauge, MetricValue::Float(v)) if !v.is_finite() => {
            Err(MetricsError::NonFiniteValue {
                metric: event.name().to_string(),
                index,
                value: v,
            })
        }
        (MetricKind::Gauge, MetricValue::Float(v)) => Ok(CheckedValue::Float(v)),
        (MetricKind::Count, MetricValue::Integer(v)) => Ok(CheckedValue::Integer(v)),
        (MetricKind::Timing, MetricValue::Duration(d)) => Ok(CheckedValue::Micros(micros(d))),
        (kind, value) => Err(MetricsError::TypeMismatch {
            metric: event.name().to_string(),
            index,
            kind,
            expected: expected_type(kind),
            found: value.type_name(),
        }),
    }
}

fn expected_type(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Gauge => "f64",
        MetricKind::Count => "i64",
        MetricKind::Timing => "Duration",
    }
}

/// Nanoseconds / 1000, truncating; saturates at `i64::MAX`.
pub fn micros(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}
