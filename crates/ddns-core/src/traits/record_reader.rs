// # Published Record Reader Trait
//
// Defines the interface for reading the IPv4 address currently published
// for a hostname.
//
// ## Implementations
//
// - DNS resolution: `ddns-resolver-dns` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for reading the currently published A record
///
/// The caller rewrites wildcard names before calling
/// (see [`lookup_name`](crate::address::lookup_name)), so implementations
/// always receive a concrete, resolvable name.
///
/// # Return values
///
/// - `Ok(Some(ip))`: the first IPv4 address the name resolves to
/// - `Ok(None)`: the name does not resolve; the record does not exist yet
/// - `Err(Error)`: any other failure (timeout, malformed response)
#[async_trait]
pub trait PublishedRecordReader: Send + Sync {
    /// Read the published IPv4 address of `name`
    async fn read_published(&self, name: &str) -> Result<Option<Ipv4Addr>, crate::Error>;

    /// Reader name (for logging/debugging)
    fn reader_name(&self) -> &'static str;
}
