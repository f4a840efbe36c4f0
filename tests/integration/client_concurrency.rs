//! Concurrent reporting against one shared client.

use super::test_utils::RecordingProvider;
use batchmetrics::{Client, MetricKind, MetricValue, Tags};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_concurrent_incr_loses_no_updates() {
    let client = Arc::new(Client::new(RecordingProvider::default()));
    let threads = client.max_buffer_size() - 1;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let client = Arc::clone(&client);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                client.incr("x", Tags::new()).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let buffered = client.buffered();
    assert_eq!(buffered.len(), threads);
    assert!(buffered.iter().all(|e| e.name() == "x"
        && e.kind() == MetricKind::Count
        && e.value() == MetricValue::Integer(1)));
    assert_eq!(client.provider().calls(), 0);
}

#[test]
fn test_concurrent_reporting_flushes_every_event_exactly_once() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let size = NonZeroUsize::new(7).unwrap();
    let client = Arc::new(Client::with_max_buffer_size(
        RecordingProvider::default(),
        size,
    ));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    client
                        .count(&format!("t{}-{}", t, i), i as i64, Tags::new())
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    client.close().unwrap();

    let batches = client.provider().batches();
    let total = THREADS * PER_THREAD;
    let full = total / size.get();
    // every threshold flush carries exactly max_buffer_size events
    assert!(batches[..full].iter().all(|b| b.len() == size.get()));
    assert_eq!(batches.len(), full + 1);
    assert_eq!(batches[full].len(), total % size.get());

    let names: HashSet<String> = batches
        .iter()
        .flatten()
        .map(|e| e.name().to_string())
        .collect();
    assert_eq!(names.len(), total);

    // per-thread call order survives batching
    for t in 0..THREADS {
        let prefix = format!("t{}-", t);
        let values: Vec<i64> = batches
            .iter()
            .flatten()
            .filter(|e| e.name().starts_with(&prefix))
            .map(|e| match e.value() {
                MetricValue::Integer(v) => v,
                other => panic!("unexpected value {:?}", other),
            })
            .collect();
        assert_eq!(values, (0..PER_THREAD as i64).collect::<Vec<_>>());
    }
}

#[test]
fn test_concurrent_close_succeeds_exactly_once() {
    let client = Arc::new(Client::new(RecordingProvider::default()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            thread::spawn(move || client.close().is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(client.provider().calls(), 1);
}
