// # Public IP Source Trait
//
// Defines the interface for discovering the caller's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP text endpoint: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::PublicIpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* PublicIpSource implementation */;
//
//     let discovered = source.discover("http://checkip.amazonaws.com").await?;
//     println!("Public IP: {}", discovered);
//
//     Ok(())
// }
// ```

use crate::address::DiscoveredAddress;
use async_trait::async_trait;

/// Trait for public-IP discovery
///
/// Implementations must be thread-safe: one handle is shared by every
/// target's task.
///
/// # Single-shot
///
/// One call issues exactly one outbound request. Implementations must not
/// retry, sleep or cache; the scheduler re-runs the lookup at the next
/// interval.
///
/// # Errors
///
/// - [`Error::Transport`](crate::Error::Transport): network failure or timeout
/// - [`Error::HttpStatus`](crate::Error::HttpStatus): non-200 response
/// - [`Error::InvalidFormat`](crate::Error::InvalidFormat): trimmed body is
///   not a strict dotted quad; the message is the trimmed body itself
///
/// A returned [`DiscoveredAddress`] always holds a valid address. The
/// reconciler validates it again before any write.
#[async_trait]
pub trait PublicIpSource: Send + Sync {
    /// Fetch the current public address from `endpoint`
    async fn discover(&self, endpoint: &str) -> Result<DiscoveredAddress, crate::Error>;

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
