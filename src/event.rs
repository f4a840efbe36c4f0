//! Event record: one reported measurement flowing from the client to a provider.

use crate::error::MetricsError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Dimensional metadata attached to an event.
pub type Tags = BTreeMap<String, String>;

/// Metric kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Point-in-time value
    Gauge,
    /// Incremental quantity
    Count,
    /// Duration sample
    Timing,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Count => "count",
            MetricKind::Timing => "timing",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gauge" => Ok(MetricKind::Gauge),
            "count" => Ok(MetricKind::Count),
            "timing" => Ok(MetricKind::Timing),
            _ => Err(MetricsError::UnrecognizedType(s.to_string())),
        }
    }
}

/// Typed measurement value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Float(f64),
    Integer(i64),
    Duration(Duration),
}

impl MetricValue {
    /// Name of the runtime type carried by this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            MetricValue::Float(_) => "f64",
            MetricValue::Integer(_) => "i64",
            MetricValue::Duration(_) => "Duration",
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<Duration> for MetricValue {
    fn from(value: Duration) -> Self {
        MetricValue::Duration(value)
    }
}

/// A single measurement. Immutable once constructed.
///
/// The matched constructors ([`Event::gauge`], [`Event::count`],
/// [`Event::timing`]) always pair the kind with its value type. [`Event::new`]
/// and [`Event::at`] accept any pairing; providers reject mismatches when
/// encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    time: DateTime<Utc>,
    value: MetricValue,
    kind: MetricKind,
    tags: Tags,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        kind: MetricKind,
        value: impl Into<MetricValue>,
        tags: Tags,
    ) -> Self {
        Self::at(name, kind, value, tags, Utc::now())
    }

    pub fn at(
        name: impl Into<String>,
        kind: MetricKind,
        value: impl Into<MetricValue>,
        tags: Tags,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            time,
            value: value.into(),
            kind,
            tags,
        }
    }

    pub fn gauge(name: impl Into<String>, value: f64, tags: Tags) -> Self {
        Self::new(name, MetricKind::Gauge, value, tags)
    }

    pub fn count(name: impl Into<String>, value: i64, tags: Tags) -> Self {
        Self::new(name, MetricKind::Count, value, tags)
    }

    pub fn timing(name: impl Into<String>, value: Duration, tags: Tags) -> Self {
        Self::new(name, MetricKind::Timing, value, tags)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn value(&self) -> MetricValue {
        self.value
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }
}

/// Build a [`Tags`] map from key/value pairs.
pub fn tags<K, V, I>(pairs: I) -> Tags
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
