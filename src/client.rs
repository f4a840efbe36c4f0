//! Client
//!
//! Public reporting API. Every call records exactly one [`Event`] into an
//! in-memory buffer; the buffer is handed to the provider when it reaches
//! `max_buffer_size` events or when the client is closed.
//!
//! All buffer mutation (append, flush, close) happens under one mutex, and the
//! provider is invoked while that mutex is held. A flush therefore blocks every
//! other reporting call on the same client until the provider returns.

use crate::config::ClientConfig;
use crate::error::MetricsError;
use crate::event::{Event, Tags};
use crate::provider::Provider;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default buffer threshold.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 50;

#[derive(Debug, Default)]
struct ClientState {
    buffer: Vec<Event>,
    closed: bool,
}

/// Batching metrics client bound to one provider.
pub struct Client<P: Provider> {
    provider: P,
    max_buffer_size: usize,
    state: Mutex<ClientState>,
}

impl<P: Provider> Client<P> {
    /// Create a client with the default buffer threshold.
    pub fn new(provider: P) -> Self {
        Self::build(provider, DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(provider: P, max_buffer_size: NonZeroUsize) -> Self {
        Self::build(provider, max_buffer_size.get())
    }

    /// Create a client from configuration.
    ///
    /// A threshold larger than the provider's batch limit is lowered to that
    /// limit.
    pub fn from_config(provider: P, config: &ClientConfig) -> Result<Self, MetricsError> {
        config.validate().map_err(MetricsError::InvalidConfig)?;

        let mut size = config.max_buffer_size;
        if let Some(limit) = provider.max_batch_size() {
            if size > limit {
                warn!(
                    provider = provider.name(),
                    configured = size,
                    limit,
                    "max_buffer_size exceeds provider batch limit, lowering"
                );
                size = limit;
            }
        }

        Ok(Self::build(provider, size))
    }

    fn build(provider: P, max_buffer_size: usize) -> Self {
        Self {
            provider,
            max_buffer_size,
            state: Mutex::new(ClientState {
                buffer: Vec::with_capacity(max_buffer_size),
                closed: false,
            }),
        }
    }

    /// Gauge measures the value of a metric at a particular time.
    pub fn gauge(&self, name: &str, value: f64, tags: Tags) -> Result<(), MetricsError> {
        self.send(Event::gauge(name, value, tags))
    }

    /// Count tracks how many times something happened.
    pub fn count(&self, name: &str, value: i64, tags: Tags) -> Result<(), MetricsError> {
        self.send(Event::count(name, value, tags))
    }

    pub fn incr(&self, name: &str, tags: Tags) -> Result<(), MetricsError> {
        self.count(name, 1, tags)
    }

    pub fn decr(&self, name: &str, tags: Tags) -> Result<(), MetricsError> {
        self.count(name, -1, tags)
    }

    pub fn timing(&self, name: &str, value: Duration, tags: Tags) -> Result<(), MetricsError> {
        self.send(Event::timing(name, value, tags))
    }

    /// Buffer one event, flushing when the buffer reaches its threshold.
    ///
    /// A flush triggered here returns the flush result as this call's result.
    pub fn send(&self, event: Event) -> Result<(), MetricsError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(MetricsError::ClientClosed);
        }

        state.buffer.push(event);
        // flush always drains, so the buffer never grows past the threshold
        if state.buffer.len() == self.max_buffer_size {
            return self.flush_locked(&mut state);
        }
        Ok(())
    }

    /// Hand the current buffer to the provider.
    pub fn flush(&self) -> Result<(), MetricsError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(MetricsError::ClientClosed);
        }
        self.flush_locked(&mut state)
    }

    /// Flush one last time and close the client.
    ///
    /// The client is closed even when the final flush fails; that failure is
    /// returned.
    pub fn close(&self) -> Result<(), MetricsError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(MetricsError::AlreadyClosed);
        }

        let result = self.flush_locked(&mut state);
        state.closed = true;
        info!(
            provider = self.provider.name(),
            ok = result.is_ok(),
            "Metrics client closed"
        );
        result
    }

    // The batch is taken out of the buffer before the provider runs; a failed
    // batch is dropped, not re-buffered.
    fn flush_locked(&self, state: &mut ClientState) -> Result<(), MetricsError> {
        let batch = std::mem::take(&mut state.buffer);
        debug!(
            provider = self.provider.name(),
            events = batch.len(),
            "Flushing metrics buffer"
        );

        let result = self.provider.send(&batch);
        if let Err(ref e) = result {
            warn!(
                provider = self.provider.name(),
                dropped = batch.len(),
                error = %e,
                "Flush failed, dropping batch"
            );
        }
        result
    }

    /// Snapshot of the buffered events, in insertion order.
    pub fn buffered(&self) -> Vec<Event> {
        self.state.lock().buffer.clone()
    }

    pub fn buffered_len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}
