//! Integration tests for the batchmetrics client and backends

mod client_buffering;
mod client_concurrency;
