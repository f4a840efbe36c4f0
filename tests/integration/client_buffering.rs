//! Buffer, flush and close behavior of the client.

use super::test_utils::{FailingTransport, RecordingProvider, RecordingTransport};
use batchmetrics::client::DEFAULT_MAX_BUFFER_SIZE;
use batchmetrics::config::ClientConfig;
use batchmetrics::provider::mixpanel::MIXPANEL_MAX_BATCH_SIZE;
use batchmetrics::{tags, Client, MetricKind, MetricValue, MetricsError, MixpanelProvider, Tags};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_events_below_threshold_stay_buffered_in_order() {
    let client = Client::new(RecordingProvider::default());

    for i in 0..DEFAULT_MAX_BUFFER_SIZE - 1 {
        client.count(&format!("m{}", i), i as i64, Tags::new()).unwrap();
    }

    let buffered = client.buffered();
    assert_eq!(buffered.len(), DEFAULT_MAX_BUFFER_SIZE - 1);
    for (i, event) in buffered.iter().enumerate() {
        assert_eq!(event.name(), format!("m{}", i));
        assert_eq!(event.value(), MetricValue::Integer(i as i64));
    }
    assert_eq!(client.provider().calls(), 0);
}

#[test]
fn test_threshold_event_flushes_exactly_once() {
    let client = Client::new(RecordingProvider::default());

    for i in 0..DEFAULT_MAX_BUFFER_SIZE {
        client.gauge(&format!("g{}", i), i as f64, Tags::new()).unwrap();
    }

    let batches = client.provider().batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), DEFAULT_MAX_BUFFER_SIZE);
    assert_eq!(batches[0][0].name(), "g0");
    assert_eq!(
        batches[0][DEFAULT_MAX_BUFFER_SIZE - 1].name(),
        format!("g{}", DEFAULT_MAX_BUFFER_SIZE - 1)
    );
    assert_eq!(client.buffered_len(), 0);

    // the next event starts a fresh buffer
    client.incr("after", Tags::new()).unwrap();
    assert_eq!(client.buffered_len(), 1);
    assert_eq!(client.provider().calls(), 1);
}

#[test]
fn test_convenience_methods_build_matching_events() {
    let client = Client::new(RecordingProvider::default());
    let t = tags([("env", "test")]);

    client.gauge("g", 1.5, t.clone()).unwrap();
    client.count("c", 7, t.clone()).unwrap();
    client.incr("i", t.clone()).unwrap();
    client.decr("d", t.clone()).unwrap();
    client.timing("t", Duration::from_micros(250), t.clone()).unwrap();

    let buffered = client.buffered();
    let summary: Vec<_> = buffered.iter().map(|e| (e.kind(), e.value())).collect();
    assert_eq!(
        summary,
        vec![
            (MetricKind::Gauge, MetricValue::Float(1.5)),
            (MetricKind::Count, MetricValue::Integer(7)),
            (MetricKind::Count, MetricValue::Integer(1)),
            (MetricKind::Count, MetricValue::Integer(-1)),
            (
                MetricKind::Timing,
                MetricValue::Duration(Duration::from_micros(250))
            ),
        ]
    );
    assert!(buffered.iter().all(|e| e.tags() == &t));
}

#[test]
fn test_close_flushes_once_and_closes() {
    let client = Client::new(RecordingProvider::default());
    client.incr("a", Tags::new()).unwrap();
    client.incr("b", Tags::new()).unwrap();

    client.close().unwrap();

    assert!(client.is_closed());
    let batches = client.provider().batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
}

#[test]
fn test_close_with_failing_provider_still_closes() {
    let client = Client::new(RecordingProvider::default());
    client.provider().set_failing(true);

    let err = client.close().unwrap_err();
    assert!(matches!(err, MetricsError::Transport { .. }));
    assert!(client.is_closed());
    assert_eq!(client.provider().calls(), 1);
}

#[test]
fn test_operations_after_close_have_no_side_effects() {
    let client = Client::new(RecordingProvider::default());
    client.close().unwrap();
    let calls = client.provider().calls();

    assert!(matches!(
        client.incr("x", Tags::new()),
        Err(MetricsError::ClientClosed)
    ));
    assert!(matches!(
        client.timing("t", Duration::from_millis(1), Tags::new()),
        Err(MetricsError::ClientClosed)
    ));
    assert!(matches!(client.flush(), Err(MetricsError::ClientClosed)));
    assert!(matches!(client.close(), Err(MetricsError::AlreadyClosed)));

    assert_eq!(client.buffered_len(), 0);
    assert_eq!(client.provider().calls(), calls);
}

#[test]
fn test_failed_flush_is_returned_by_triggering_call_and_dropped() {
    let client = Client::new(RecordingProvider::default());
    client.provider().set_failing(true);

    for _ in 0..DEFAULT_MAX_BUFFER_SIZE - 1 {
        client.incr("x", Tags::new()).unwrap();
    }
    assert!(client.incr("x", Tags::new()).is_err());
    assert_eq!(client.buffered_len(), 0);
    assert!(!client.is_closed());
}

#[test]
fn test_client_over_mixpanel_sends_one_request_per_flush() {
    let transport = Arc::new(RecordingTransport::default());
    let provider = MixpanelProvider::new("tok".to_string(), None, transport.clone());
    let client = Client::new(provider);

    for _ in 0..DEFAULT_MAX_BUFFER_SIZE {
        client.incr("x", Tags::new()).unwrap();
    }
    client.incr("y", Tags::new()).unwrap();
    client.close().unwrap();

    assert_eq!(transport.requests().len(), 2);
}

#[test]
fn test_type_mismatch_via_generic_send_fails_on_flush() {
    let transport = Arc::new(RecordingTransport::default());
    let provider = MixpanelProvider::new("tok".to_string(), None, transport.clone());
    let client = Client::new(provider);

    client
        .send(batchmetrics::Event::new(
            "bad",
            MetricKind::Count,
            MetricValue::Float(1.0),
            Tags::new(),
        ))
        .unwrap();

    let err = client.close().unwrap_err();
    assert!(matches!(err, MetricsError::TypeMismatch { expected: "i64", .. }));
    assert!(transport.requests().is_empty());
}

#[test]
fn test_transport_failure_is_wrapped() {
    let provider = MixpanelProvider::new("tok".to_string(), None, Arc::new(FailingTransport(503)));
    let client = Client::new(provider);
    client.incr("x", Tags::new()).unwrap();

    match client.close() {
        Err(MetricsError::Transport { backend, source }) => {
            assert_eq!(backend, "mixpanel");
            assert!(source.to_string().contains("503"));
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[test]
fn test_from_config_lowers_threshold_to_mixpanel_limit() {
    let transport = Arc::new(RecordingTransport::default());
    let provider = MixpanelProvider::new("tok".to_string(), None, transport.clone());
    let client = Client::from_config(provider, &ClientConfig { max_buffer_size: 200 }).unwrap();
    assert_eq!(client.max_buffer_size(), MIXPANEL_MAX_BATCH_SIZE);

    for _ in 0..MIXPANEL_MAX_BATCH_SIZE {
        client.incr("x", Tags::new()).unwrap();
    }
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(client.buffered_len(), 0);
}

#[test]
fn test_from_config_keeps_smaller_threshold() {
    let provider = MixpanelProvider::new(
        "tok".to_string(),
        None,
        Arc::new(RecordingTransport::default()),
    );
    let client = Client::from_config(provider, &ClientConfig { max_buffer_size: 10 }).unwrap();
    assert_eq!(client.max_buffer_size(), 10);
}
