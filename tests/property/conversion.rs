//! Property-based tests for timing conversion

use batchmetrics::provider::encoding::{checked_value, micros, CheckedValue};
use batchmetrics::{Event, Tags};
use proptest::prelude::*;
use std::time::Duration;

#[test]
fn test_micros_truncates_nanoseconds() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<u64>(), |nanos| {
            let duration = Duration::from_nanos(nanos);
            prop_assert_eq!(micros(duration), (nanos / 1_000) as i64);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_timing_events_always_check_as_micros() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0u64..1_000_000_000, 0u32..1_000_000_000), |(secs, nanos)| {
            let duration = Duration::new(secs, nanos);
            let event = Event::timing("t", duration, Tags::new());
            let expected = secs as i64 * 1_000_000 + (nanos / 1_000) as i64;
            prop_assert_eq!(checked_value(&event, 0).unwrap(), CheckedValue::Micros(expected));
            Ok(())
        })
        .unwrap();
}
