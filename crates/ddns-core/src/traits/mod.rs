//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PublicIpSource`]: Discover the caller's public IPv4 address
//! - [`PublishedRecordReader`]: Read the address currently published for a name
//! - [`DnsProvider`]: Upsert A records via provider APIs

pub mod ip_source;
pub mod record_reader;
pub mod dns_provider;

pub use ip_source::PublicIpSource;
pub use record_reader::PublishedRecordReader;
pub use dns_provider::{
    Change, ChangeAction, ChangeBatch, ChangeReceipt, ChangeRequest, DnsProvider, RecordType,
    ResourceRecord, ResourceRecordSet,
};
