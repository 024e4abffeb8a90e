// # ddns-core
//
// Core library for the Route53 dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the decision logic for keeping A records in sync
// with a changing public IPv4 address:
// - **PublicIpSource**: Trait for discovering the current public IP
// - **PublishedRecordReader**: Trait for reading the currently published record
// - **DnsProvider**: Trait for upserting records via provider APIs
// - **Reconciler**: One discover → read → compare → write cycle for one hostname
// - **Scheduler**: One independent task per hostname, single pass or forever
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from network implementations
// 2. **Failure Isolation**: A cycle yields an `UpdateOutcome`, never an error
// 3. **Stateless**: Every cycle re-reads the published value; nothing is persisted
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: Writes are UPSERTs, safe to repeat with identical data

pub mod address;
pub mod traits;
pub mod reconciler;
pub mod scheduler;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use address::{DiscoveredAddress, PublishedAddress};
pub use traits::{DnsProvider, PublicIpSource, PublishedRecordReader};
pub use reconciler::{Reconciler, UpdateOutcome};
pub use scheduler::{Scheduler, SchedulerEvent};
pub use config::{DdnsConfig, ReconciliationTarget};
pub use error::{Error, Result};
