//! IPv4 address validation and hostname helpers
//!
//! The public-IP endpoint returns free text, so everything it sends passes
//! through [`parse_dotted_quad`] before it can reach a DNS write.

use crate::error::{Error, Result};
use std::borrow::Cow;
use std::fmt;
use std::net::Ipv4Addr;

/// Label substituted for `*` when a wildcard name has to be resolved
pub const WILDCARD_PROBE_LABEL: &str = "ddns-wildcard-probe";

const WILDCARD_PREFIX: &str = "*.";

/// Parse a strict dotted-decimal IPv4 literal
///
/// Exactly four octets separated by three dots, each octet 1-3 ASCII digits
/// in 0..=255 without leading zeros. Nothing else is accepted: no
/// whitespace, no signs, no shorthand forms like `127.1`.
pub fn parse_dotted_quad(text: &str) -> Result<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut count = 0;

    for part in text.split('.') {
        if count == 4 {
            return Err(Error::validation(format!(
                "too many octets in '{}'",
                text
            )));
        }

        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation(format!(
                "octet '{}' in '{}' is not a decimal number",
                part, text
            )));
        }

        if part.len() > 1 && part.starts_with('0') {
            return Err(Error::validation(format!(
                "octet '{}' in '{}' has a leading zero",
                part, text
            )));
        }

        let value: u16 = part
            .parse()
            .map_err(|_| Error::validation(format!("octet '{}' in '{}'", part, text)))?;
        octets[count] = u8::try_from(value).map_err(|_| {
            Error::validation(format!("octet {} in '{}' is out of range", value, text))
        })?;
        count += 1;
    }

    if count != 4 {
        return Err(Error::validation(format!(
            "expected 4 octets in '{}', found {}",
            text, count
        )));
    }

    Ok(Ipv4Addr::from(octets))
}

/// Whether `text` is a strict dotted-quad IPv4 literal
pub fn is_valid_ipv4(text: &str) -> bool {
    parse_dotted_quad(text).is_ok()
}

/// Whether the hostname starts with a wildcard label
pub fn is_wildcard(hostname: &str) -> bool {
    hostname.starts_with(WILDCARD_PREFIX)
}

/// Name to resolve when reading the published record for `hostname`
///
/// Wildcard names cannot be queried directly, so `*.example.com` becomes
/// `ddns-wildcard-probe.example.com`. Other names are returned unchanged.
pub fn lookup_name(hostname: &str) -> Cow<'_, str> {
    match hostname.strip_prefix(WILDCARD_PREFIX) {
        Some(base) => Cow::Owned(format!("{}.{}", WILDCARD_PROBE_LABEL, base)),
        None => Cow::Borrowed(hostname),
    }
}

/// Wildcard sibling of a named record (`example.com` -> `*.example.com`)
///
/// Returns `None` when the hostname already is a wildcard.
pub fn wildcard_sibling(hostname: &str) -> Option<String> {
    if is_wildcard(hostname) {
        None
    } else {
        Some(format!("{}{}", WILDCARD_PREFIX, hostname))
    }
}

/// The result of one public-IP lookup
///
/// Keeps the raw text next to the parsed address so an invalid response can
/// still be logged verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredAddress {
    text: String,
    address: Option<Ipv4Addr>,
}

impl DiscoveredAddress {
    /// Build from raw endpoint text (surrounding whitespace is trimmed)
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into().trim().to_string();
        let address = parse_dotted_quad(&text).ok();
        Self { text, address }
    }

    /// The trimmed text as returned by the endpoint
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed address, if the text was a valid dotted quad
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    pub fn is_valid(&self) -> bool {
        self.address.is_some()
    }
}

impl fmt::Display for DiscoveredAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The result of one read of the currently published record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedAddress {
    /// The name resolves to this address
    Present(Ipv4Addr),
    /// The name does not resolve yet (first-time publish)
    Absent,
    /// The lookup failed; the published value is unknown
    Unresolvable(String),
}

impl PublishedAddress {
    /// The published address, if known
    pub fn address(&self) -> Option<Ipv4Addr> {
        match self {
            PublishedAddress::Present(ip) => Some(*ip),
            _ => None,
        }
    }

    /// Whether the published record already carries `ip`
    ///
    /// An absent or unresolvable record never matches.
    pub fn matches(&self, ip: Ipv4Addr) -> bool {
        self.address() == Some(ip)
    }
}

impl fmt::Display for PublishedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishedAddress::Present(ip) => write!(f, "{}", ip),
            PublishedAddress::Absent => f.write_str("<absent>"),
            PublishedAddress::Unresolvable(_) => f.write_str("<unknown>"),
        }
    }
}
