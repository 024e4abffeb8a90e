//! Test doubles and common utilities for contract tests
//!
//! This module provides in-memory collaborators that record how the
//! reconciler uses them, without touching the network.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{
    ChangeReceipt, ChangeRequest, DnsProvider, PublicIpSource, PublishedRecordReader,
};
use ddns_core::{
    DiscoveredAddress, Reconciler, ReconciliationTarget, SchedulerEvent, UpdateOutcome,
};
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ZONE_ID: &str = "ZTESTZONE";

/// What a scripted endpoint answers
#[derive(Debug, Clone)]
pub enum IpAnswer {
    /// 200 with this body
    Body(String),
    /// Body rejected by the source as not a dotted quad
    InvalidFormat(String),
    /// Non-200 status
    Status(u16),
    /// Connection failure
    Transport,
    /// Collaborator bug
    Panic,
}

/// An IP source answering per endpoint URL
pub struct ScriptedIpSource {
    answers: Mutex<HashMap<String, IpAnswer>>,
    default: Mutex<IpAnswer>,
    calls: AtomicUsize,
    panics_left: AtomicUsize,
}

impl ScriptedIpSource {
    /// Every endpoint answers with `ip`
    pub fn returning(ip: &str) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(HashMap::new()),
            default: Mutex::new(IpAnswer::Body(ip.to_string())),
            calls: AtomicUsize::new(0),
            panics_left: AtomicUsize::new(0),
        })
    }

    /// Every endpoint answers with `answer`
    pub fn answering(answer: IpAnswer) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(HashMap::new()),
            default: Mutex::new(answer),
            calls: AtomicUsize::new(0),
            panics_left: AtomicUsize::new(0),
        })
    }

    /// Override the answer for one endpoint
    pub fn set_answer(&self, endpoint: &str, answer: IpAnswer) {
        self.answers
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), answer);
    }

    /// Change the answer for all endpoints without an override
    pub fn set_default(&self, answer: IpAnswer) {
        *self.default.lock().unwrap() = answer;
    }

    /// Panic on the next `times` calls before answering normally
    pub fn panic_times(&self, times: usize) {
        self.panics_left.store(times, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PublicIpSource for ScriptedIpSource {
    async fn discover(&self, endpoint: &str) -> Result<DiscoveredAddress> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self
            .panics_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            panic!("scripted source panicked for {}", endpoint);
        }

        let answer = self
            .answers
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| self.default.lock().unwrap().clone());

        match answer {
            IpAnswer::Body(body) => Ok(DiscoveredAddress::new(body)),
            IpAnswer::InvalidFormat(raw) => Err(Error::invalid_format(raw)),
            IpAnswer::Status(status) => Err(Error::http_status(endpoint, status)),
            IpAnswer::Transport => Err(Error::transport("connection refused")),
            IpAnswer::Panic => panic!("scripted source panicked for {}", endpoint),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// What the published-record lookup returns for a name
#[derive(Debug, Clone)]
pub enum Published {
    Present(Ipv4Addr),
    Absent,
    Failing,
}

/// A record reader backed by a map, recording looked-up names
pub struct StaticRecordReader {
    records: Mutex<HashMap<String, Published>>,
    lookups: Mutex<Vec<String>>,
}

impl StaticRecordReader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(HashMap::new()),
            lookups: Mutex::new(Vec::new()),
        })
    }

    pub fn with(name: &str, published: Published) -> Arc<Self> {
        let reader = Self::new();
        reader.set(name, published);
        reader
    }

    pub fn set(&self, name: &str, published: Published) {
        self.records
            .lock()
            .unwrap()
            .insert(name.to_string(), published);
    }

    /// Names passed to read_published(), in call order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PublishedRecordReader for StaticRecordReader {
    async fn read_published(&self, name: &str) -> Result<Option<Ipv4Addr>> {
        self.lookups.lock().unwrap().push(name.to_string());

        match self.records.lock().unwrap().get(name) {
            Some(Published::Present(ip)) => Ok(Some(*ip)),
            Some(Published::Absent) | None => Ok(None),
            Some(Published::Failing) => Err(Error::resolution("SERVFAIL")),
        }
    }

    fn reader_name(&self) -> &'static str {
        "static"
    }
}

/// A provider that records every request
pub struct RecordingProvider {
    requests: Mutex<Vec<ChangeRequest>>,
    failing_names: Mutex<HashSet<String>>,
    fail_all: bool,
    delay: Duration,
}

impl RecordingProvider {
    pub fn new() -> Arc<Self> {
        Self::build(false, Duration::ZERO)
    }

    /// A provider rejecting every write
    pub fn failing() -> Arc<Self> {
        Self::build(true, Duration::ZERO)
    }

    /// A provider that takes `delay` to answer
    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(false, delay)
    }

    fn build(fail_all: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            failing_names: Mutex::new(HashSet::new()),
            fail_all,
            delay,
        })
    }

    /// Reject writes whose first record is `name`
    pub fn fail_for(&self, name: &str) {
        self.failing_names.lock().unwrap().insert(name.to_string());
    }

    pub fn upsert_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChangeRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose first record is `name`
    pub fn requests_for(&self, name: &str) -> Vec<ChangeRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.record_names().first() == Some(&name))
            .collect()
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn upsert(&self, request: &ChangeRequest) -> Result<ChangeReceipt> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.requests.lock().unwrap().push(request.clone());

        let primary = request
            .record_names()
            .first()
            .map(|name| name.to_string())
            .unwrap_or_default();

        if self.fail_all || self.failing_names.lock().unwrap().contains(&primary) {
            return Err(Error::provider("recording", "InvalidChangeBatch"));
        }

        Ok(ChangeReceipt {
            id: Some(format!("/change/C{}", self.upsert_count())),
            status: "PENDING".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Reconciler wired to the given doubles
pub fn reconciler(
    ip_source: &Arc<ScriptedIpSource>,
    reader: &Arc<StaticRecordReader>,
    provider: &Arc<RecordingProvider>,
) -> Reconciler {
    Reconciler::new(ip_source.clone(), reader.clone(), provider.clone())
}

/// Target in the test zone with a per-host endpoint
pub fn target(hostname: &str) -> ReconciliationTarget {
    ReconciliationTarget::new(ZONE_ID, hostname)
        .with_public_ip_url(endpoint_for(hostname))
        .with_ttl(300)
}

/// Endpoint URL used by `target(hostname)`
pub fn endpoint_for(hostname: &str) -> String {
    format!("http://ip.test/{}", hostname)
}

/// Wait for the next CycleCompleted event and return its outcome
pub async fn next_outcome(
    events: &mut tokio::sync::mpsc::Receiver<SchedulerEvent>,
) -> UpdateOutcome {
    next_cycle(events).await.1
}

/// Wait for the next CycleCompleted event
pub async fn next_cycle(
    events: &mut tokio::sync::mpsc::Receiver<SchedulerEvent>,
) -> (String, UpdateOutcome) {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("cycle completes in time")
            .expect("scheduler still running");

        if let SchedulerEvent::CycleCompleted { hostname, outcome } = event {
            return (hostname, outcome);
        }
    }
}

/// Drain every event currently buffered
pub fn drain(events: &mut tokio::sync::mpsc::Receiver<SchedulerEvent>) -> Vec<SchedulerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
