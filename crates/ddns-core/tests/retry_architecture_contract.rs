//! Contract Test: Interval-Owned Retry
//!
//! Verifies that failures are retried by the schedule, not inside a cycle.
//!
//! Constraints verified:
//! - A failing lookup or write is attempted exactly once per cycle
//! - The next scheduled cycle retries from scratch
//! - A transient failure heals without operator intervention
//!
//! If this test fails, someone has added hidden retry loops to the
//! reconciler or the scheduler stopped after an error.

mod common;

use common::*;
use ddns_core::{Scheduler, UpdateOutcome};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn failed_write_is_attempted_once_per_cycle() {
    let ip_source = ScriptedIpSource::returning("203.0.113.5");
    let reader = StaticRecordReader::new();
    let provider = RecordingProvider::failing();
    let reconciler = reconciler(&ip_source, &reader, &provider);

    let outcome = reconciler.reconcile(&target("home.example.com")).await;

    assert!(matches!(outcome, UpdateOutcome::SkippedProviderError { .. }));
    assert_eq!(provider.upsert_count(), 1);
    assert_eq!(ip_source.call_count(), 1);
}

#[tokio::test]
async fn transient_lookup_failure_heals_at_next_interval() {
    let ip_source = ScriptedIpSource::answering(IpAnswer::Status(502));
    let reader = StaticRecordReader::new();
    let provider = RecordingProvider::new();

    let (scheduler, mut events) = Scheduler::new(
        Arc::new(reconciler(&ip_source, &reader, &provider)),
        vec![target("home.example.com")],
        Duration::from_millis(100),
        true,
    )
    .expect("scheduler construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { scheduler.run_with_shutdown(Some(shutdown_rx)).await });

    // First cycle fails.
    let first = next_outcome(&mut events).await;
    assert!(matches!(first, UpdateOutcome::SkippedLookupFailed { .. }));
    assert_eq!(provider.upsert_count(), 0);

    // Endpoint recovers before the next interval.
    ip_source.set_default(IpAnswer::Body("203.0.113.5".to_string()));

    let second = next_outcome(&mut events).await;
    assert!(second.is_updated(), "got {:?}", second);
    assert_eq!(provider.upsert_count(), 1);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
