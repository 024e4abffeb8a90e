//! Contract Test: Idempotency
//!
//! Verifies that an unchanged public IP never causes a DNS write.
//!
//! Constraints verified:
//! - Equal discovered and published IPs yield NoChangeNeeded
//! - Repeated cycles with unchanged data issue zero writes
//! - Nothing is cached between cycles: every cycle re-reads the published record
//!
//! If this test fails, the updater would hammer the provider on every interval.

mod common;

use common::*;
use ddns_core::UpdateOutcome;
use std::net::Ipv4Addr;

#[tokio::test]
async fn unchanged_ip_twice_yields_no_change_and_no_writes() {
    let ip = Ipv4Addr::new(203, 0, 113, 5);
    let ip_source = ScriptedIpSource::returning("203.0.113.5");
    let reader = StaticRecordReader::with("home.example.com", Published::Present(ip));
    let provider = RecordingProvider::new();
    let reconciler = reconciler(&ip_source, &reader, &provider);
    let target = target("home.example.com");

    let first = reconciler.reconcile(&target).await;
    let second = reconciler.reconcile(&target).await;

    assert_eq!(first, UpdateOutcome::NoChangeNeeded { ip });
    assert_eq!(second, UpdateOutcome::NoChangeNeeded { ip });
    assert_eq!(
        provider.upsert_count(),
        0,
        "Expected zero writes for an unchanged IP, got {}",
        provider.upsert_count()
    );
}

#[tokio::test]
async fn every_cycle_rereads_published_record() {
    let ip_source = ScriptedIpSource::returning("203.0.113.5");
    let reader = StaticRecordReader::with(
        "home.example.com",
        Published::Present(Ipv4Addr::new(203, 0, 113, 5)),
    );
    let provider = RecordingProvider::new();
    let reconciler = reconciler(&ip_source, &reader, &provider);
    let target = target("home.example.com");

    for _ in 0..3 {
        reconciler.reconcile(&target).await;
    }

    assert_eq!(ip_source.call_count(), 3);
    assert_eq!(reader.lookups().len(), 3);
}

#[tokio::test]
async fn update_then_propagation_settles_to_no_change() {
    let ip_source = ScriptedIpSource::returning("203.0.113.5");
    let reader = StaticRecordReader::with(
        "home.example.com",
        Published::Present(Ipv4Addr::new(203, 0, 113, 4)),
    );
    let provider = RecordingProvider::new();
    let reconciler = reconciler(&ip_source, &reader, &provider);
    let target = target("home.example.com");

    let first = reconciler.reconcile(&target).await;
    assert!(first.is_updated());

    // The record has propagated by the next interval.
    reader.set(
        "home.example.com",
        Published::Present(Ipv4Addr::new(203, 0, 113, 5)),
    );

    let second = reconciler.reconcile(&target).await;
    assert_eq!(
        second,
        UpdateOutcome::NoChangeNeeded {
            ip: Ipv4Addr::new(203, 0, 113, 5)
        }
    );
    assert_eq!(provider.upsert_count(), 1, "Only the first cycle should write");
}

#[tokio::test]
async fn unpropagated_record_is_upserted_again_with_identical_data() {
    // The published value comes from DNS, so until propagation the same
    // UPSERT is repeated. Identical UPSERTs are no-ops for the provider.
    let ip_source = ScriptedIpSource::returning("203.0.113.5");
    let reader = StaticRecordReader::with(
        "home.example.com",
        Published::Present(Ipv4Addr::new(203, 0, 113, 4)),
    );
    let provider = RecordingProvider::new();
    let reconciler = reconciler(&ip_source, &reader, &provider);
    let target = target("home.example.com");

    reconciler.reconcile(&target).await;
    reconciler.reconcile(&target).await;

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}
