//! batchmetrics: a batching metrics-emission client
//!
//! Application code reports gauges, counters and timings through a
//! [`Client`]. Events are buffered in memory and handed in batches to a
//! [`Provider`], which validates and encodes them for its backend before
//! passing the request to a [`Transport`](transport::Transport).
//!
//! ```no_run
//! use batchmetrics::{tags, Client, MixpanelProvider, Tags};
//! use batchmetrics::transport::HttpTransport;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let transport = Arc::new(HttpTransport::new()?);
//! let client = Client::new(MixpanelProvider::new("token".to_string(), None, transport));
//!
//! client.incr("signups", tags([("plan", "pro")]))?;
//! client.timing("render", Duration::from_millis(12), Tags::new())?;
//! client.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod provider;
pub mod transport;

pub use client::Client;
pub use error::MetricsError;
pub use event::{tags, Event, MetricKind, MetricValue, Tags};
pub use provider::{Backend, MixpanelProvider, Provider, ProviderConfig, StackdriverProvider};
