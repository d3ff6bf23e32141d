// Reading tests: partitioning, gauge/cumulative/delta values, metadata selection, conversion

mod common;

use cloud_usage::conversions::{ConversionRegistry, Resolution};
use cloud_usage::error::UsageError;
use cloud_usage::reading::Reading;
use common::*;
use serde_json::json;

const START: &str = "2024-01-01T00:00:00";
const STOP: &str = "2024-01-01T03:00:00";

#[test]
fn gauge_constant_over_one_hour_equals_volume() {
    let samples = vec![
        sample("r1", "2024-01-01T01:00:00", 2.0, "gauge"),
        sample("r1", "2024-01-01T02:00:00", 2.0, "gauge"),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();

    assert_eq!(reading.value(), Some(2.0));
    assert_eq!(reading.usage_start(), Some(ts("2024-01-01T01:00:00")));
    assert_eq!(reading.usage_stop(), Some(ts("2024-01-01T02:00:00")));
    assert_eq!(reading.usage_hours(), Some(1.0));
}

#[test]
fn gauge_extends_to_window_edges_when_resource_seen_outside() {
    let samples = vec![
        sample("r1", "2023-12-31T23:00:00", 1.0, "gauge"),
        sample("r1", "2024-01-01T01:00:00", 1.0, "gauge"),
        sample("r1", "2024-01-01T02:00:00", 3.0, "gauge"),
        sample("r1", "2024-01-01T04:00:00", 3.0, "gauge"),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();

    assert!(reading.resource_existed_before());
    assert!(reading.resource_existed_after());
    assert_eq!(reading.usage_start(), Some(ts(START)));
    assert_eq!(reading.usage_stop(), Some(ts(STOP)));
    // 1h at 1, a 1h ramp from 1 to 3, 1h at 3.
    assert_eq!(reading.value(), Some(1.0 + 2.0 + 3.0));
    assert_eq!(reading.samples().len(), 2);
}

#[test]
fn gauge_single_sample_has_zero_area() {
    let samples = vec![sample("r1", "2024-01-01T01:00:00", 4.0, "gauge")];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.value(), Some(0.0));
}

#[test]
fn cumulative_is_last_minus_first() {
    let samples = vec![
        sample("r1", "2024-01-01T00:30:00", 10.0, "cumulative"),
        sample("r1", "2024-01-01T01:30:00", 15.0, "cumulative"),
        sample("r1", "2024-01-01T02:30:00", 40.0, "cumulative"),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.value(), Some(30.0));

    let single = vec![sample("r1", "2024-01-01T00:30:00", 10.0, "cumulative")];
    let reading = Reading::new(single, window(START, STOP)).unwrap();
    assert_eq!(reading.value(), Some(0.0));
}

#[test]
fn cumulative_ignores_samples_outside_window() {
    let samples = vec![
        sample("r1", "2023-12-31T22:00:00", 1.0, "cumulative"),
        sample("r1", "2024-01-01T00:30:00", 10.0, "cumulative"),
        sample("r1", "2024-01-01T02:30:00", 12.0, "cumulative"),
        sample("r1", "2024-01-01T05:00:00", 99.0, "cumulative"),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.value(), Some(2.0));
}

#[test]
fn delta_is_sum_of_volumes() {
    let samples = vec![
        sample("r1", "2024-01-01T00:10:00", 1.5, "delta"),
        sample("r1", "2024-01-01T00:20:00", 2.5, "delta"),
        sample("r1", "2024-01-01T00:30:00", 4.0, "delta"),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.value(), Some(8.0));
}

#[test]
fn window_bounds_are_inclusive() {
    let samples = vec![
        sample("r1", START, 1.0, "delta"),
        sample("r1", STOP, 1.0, "delta"),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.samples().len(), 2);
    assert!(!reading.resource_existed_before());
    assert!(!reading.resource_existed_after());
}

#[test]
fn no_samples_in_window_has_no_value() {
    let samples = vec![
        sample("r1", "2023-12-31T23:00:00", 1.0, "gauge"),
        sample("r1", "2024-01-01T05:00:00", 1.0, "gauge"),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();

    assert_eq!(reading.value(), None);
    assert!(reading.metadata().is_none());
    assert!(reading.samples().is_empty());
    assert!(reading.resource_existed_before());
    assert!(reading.resource_existed_after());
    assert_eq!(reading.resource_id(), None);
    assert_eq!(reading.usage_start(), None);
}

#[test]
fn unknown_counter_type_fails() {
    let samples = vec![sample("r1", "2024-01-01T01:00:00", 1.0, "weird")];
    let err = Reading::new(samples, window(START, STOP)).unwrap_err();
    assert!(matches!(err, UsageError::UnknownCounterType(t) if t == "weird"));
}

#[test]
fn meter_type_comes_from_first_in_window_sample() {
    let samples = vec![
        sample("r1", "2023-12-31T23:00:00", 1.0, "weird"),
        sample("r1", "2024-01-01T01:00:00", 2.0, "delta"),
        sample("r1", "2024-01-01T02:00:00", 3.0, "cumulative"),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.meter_type().map(|t| t.as_str()), Some("delta"));
    assert_eq!(reading.value(), Some(5.0));
}

#[test]
fn metadata_is_most_recent_live_snapshot() {
    let samples = vec![
        with_metadata(
            sample("r1", "2024-01-01T00:10:00", 1.0, "gauge"),
            json!({"status": "active", "flavor": "small"}),
        ),
        with_metadata(
            sample("r1", "2024-01-01T00:20:00", 1.0, "gauge"),
            json!({"status": "deleting"}),
        ),
        with_metadata(
            sample("r1", "2024-01-01T00:30:00", 1.0, "gauge"),
            json!({"status": "active", "flavor": "large"}),
        ),
        with_metadata(
            sample("r1", "2024-01-01T00:40:00", 1.0, "gauge"),
            json!({"state": "deleted"}),
        ),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.metadata().unwrap()["flavor"], "large");
}

#[test]
fn metadata_falls_back_to_last_sample() {
    let samples = vec![
        with_metadata(
            sample("r1", "2024-01-01T00:10:00", 1.0, "gauge"),
            json!({"name": "first"}),
        ),
        with_metadata(
            sample("r1", "2024-01-01T00:20:00", 1.0, "gauge"),
            json!({"name": "last"}),
        ),
    ];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.metadata().unwrap()["name"], "last");

    let all_deleted = vec![
        with_metadata(
            sample("r1", "2024-01-01T00:10:00", 1.0, "gauge"),
            json!({"status": "deleting", "name": "first"}),
        ),
        with_metadata(
            sample("r1", "2024-01-01T00:20:00", 1.0, "gauge"),
            json!({"status": "deleted", "name": "last"}),
        ),
    ];
    let reading = Reading::new(all_deleted, window(START, STOP)).unwrap();
    assert_eq!(reading.metadata().unwrap()["name"], "last");
}

#[test]
fn identity_comes_from_samples() {
    let mut last = sample("r1", "2024-01-01T00:20:00", 1.0, "delta");
    last.meter = "network.outgoing.bytes".into();
    let samples = vec![sample("r1", "2024-01-01T00:10:00", 1.0, "delta"), last];
    let reading = Reading::new(samples, window(START, STOP)).unwrap();

    assert_eq!(reading.resource_id(), Some("r1"));
    assert_eq!(reading.project_id(), Some("p1"));
    assert_eq!(reading.meter_name(), Some("network.outgoing.bytes"));
    assert_eq!(reading.start(), ts(START));
    assert_eq!(reading.stop(), ts(STOP));
}

#[test]
fn convert_replaces_value() {
    let samples = vec![
        sample("r1", "2024-01-01T00:10:00", 3600.0, "delta"),
        sample("r1", "2024-01-01T00:20:00", 3600.0, "delta"),
    ];
    let mut reading = Reading::new(samples, window(START, STOP)).unwrap();
    let registry = ConversionRegistry::builtin();

    let result = reading.convert(&registry, Some("seconds_to_hours"));

    assert_eq!(result, Some(Resolution::Resolved(2.0)));
    assert_eq!(reading.value(), Some(2.0));
}

#[test]
fn convert_without_name_or_value_is_noop() {
    let registry = ConversionRegistry::builtin();
    let samples = vec![sample("r1", "2024-01-01T00:10:00", 5.0, "delta")];
    let mut reading = Reading::new(samples, window(START, STOP)).unwrap();
    assert_eq!(reading.convert(&registry, None), None);
    assert_eq!(reading.value(), Some(5.0));

    let outside = vec![sample("r1", "2024-01-02T00:10:00", 5.0, "delta")];
    let mut empty = Reading::new(outside, window(START, STOP)).unwrap();
    assert_eq!(empty.convert(&registry, Some("seconds_to_hours")), None);
    assert_eq!(empty.value(), None);
}

#[test]
fn convert_unknown_name_drops_value() {
    let registry = ConversionRegistry::builtin();
    let samples = vec![sample("r1", "2024-01-01T00:10:00", 5.0, "delta")];
    let mut reading = Reading::new(samples, window(START, STOP)).unwrap();

    let result = reading.convert(&registry, Some("furlongs_to_parsecs")).unwrap();

    assert!(!result.is_resolved());
    assert_eq!(reading.value(), None);
}
