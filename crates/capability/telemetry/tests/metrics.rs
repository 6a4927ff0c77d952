use tagbridge_telemetry::{
    TelemetryMetrics, init_tracing, metrics, record_retry, record_tag_read, record_tag_write,
};

#[test]
fn counters_only_grow() {
    let before = metrics().snapshot();
    record_retry();
    record_tag_read(true);
    record_tag_read(false);
    record_tag_write(false);
    let after = metrics().snapshot();

    assert!(after.retries >= before.retries + 1);
    assert!(after.tag_reads_ok >= before.tag_reads_ok + 1);
    assert!(after.tag_reads_failed >= before.tag_reads_failed + 1);
    assert!(after.tag_writes_failed >= before.tag_writes_failed + 1);
}

#[test]
fn fresh_metrics_start_at_zero() {
    let snapshot = TelemetryMetrics::new().snapshot();
    assert_eq!(snapshot, Default::default());
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
