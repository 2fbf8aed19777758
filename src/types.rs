use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use crate::error::FabricError;

/// Link and path costs. Non-negative by construction.
pub type Cost = u32;

/// Reserved maximum cost marking "no known path". Never installed in a table.
pub const UNREACHABLE: Cost = 1_000_000_000;

/// Add a link cost to an advertised cost, saturating at [`UNREACHABLE`].
pub fn link_add(link: Cost, cost: Cost) -> Cost {
    link.saturating_add(cost).min(UNREACHABLE)
}

/// Textual router identity of the form `host:port`.
///
/// Equality is byte-exact and ordering is lexicographic; the ordering is what
/// makes equal-cost tie-breaking deterministic across the fabric.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Validate and wrap a `host:port` string.
    pub fn new(raw: impl Into<String>) -> Result<Self, FabricError> {
        let raw = raw.into();
        let mut parts = raw.split(':');
        let host = parts.next().unwrap_or("");
        let port = parts.next();
        if host.is_empty() || port.is_none() || parts.next().is_some() {
            return Err(FabricError::InvalidArgument(format!(
                "invalid address {raw:?}: must be in host:port format"
            )));
        }
        match port.and_then(|p| p.parse::<u16>().ok()) {
            Some(p) if p > 0 => Ok(Self(raw)),
            _ => Err(FabricError::InvalidArgument(format!(
                "invalid port in address {raw:?}"
            ))),
        }
    }

    /// Build an address from trusted parts, skipping validation.
    pub fn from_host_port(host: &str, port: u16) -> Self {
        Self(format!("{host}:{port}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn host(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }

    pub fn port(&self) -> u16 {
        self.0
            .split(':')
            .nth(1)
            .and_then(|p| p.parse().ok())
            .unwrap_or(0)
    }

    /// Whether a datagram received from `src` can be attributed to this
    /// address. Exact text match, or a loopback source whose port matches a
    /// loopback-named host (`localhost` advertisements arrive as `127.0.0.1`).
    pub fn matches_source(&self, src: &SocketAddr) -> bool {
        if self.0 == src.to_string() {
            return true;
        }
        src.ip().is_loopback()
            && self.port() == src.port()
            && matches!(self.host(), "localhost" | "127.0.0.1")
    }

    /// Resolve to a concrete IPv4 socket address.
    pub fn resolve(&self) -> Result<SocketAddr, FabricError> {
        self.0
            .to_socket_addrs()
            .map_err(|e| {
                FabricError::InvalidArgument(format!("cannot resolve {}: {e}", self.0))
            })?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| {
                FabricError::InvalidArgument(format!("no IPv4 address for {}", self.0))
            })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = FabricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_host_port() {
        assert!(Address::new("localhost:9001").is_ok());
        assert!(Address::new("10.0.0.7:2089").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in ["localhost", "localhost:", ":9001", "a:b:9001", "host:0", "host:x", "host:99999"] {
            assert!(Address::new(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Address::new("localhost:9002").unwrap();
        let b = Address::new("localhost:9003").unwrap();
        assert!(a < b);
        // Byte order, not numeric port order.
        let short = Address::new("localhost:91").unwrap();
        assert!(b < short);
    }

    #[test]
    fn matches_loopback_source() {
        let addr = Address::new("localhost:9001").unwrap();
        assert!(addr.matches_source(&"127.0.0.1:9001".parse().unwrap()));
        assert!(!addr.matches_source(&"127.0.0.1:9002".parse().unwrap()));
        assert!(!addr.matches_source(&"10.0.0.7:9001".parse().unwrap()));
    }

    #[test]
    fn link_add_saturates_at_sentinel() {
        assert_eq!(link_add(3, 4), 7);
        assert_eq!(link_add(UNREACHABLE, 1), UNREACHABLE);
        assert_eq!(link_add(Cost::MAX, Cost::MAX), UNREACHABLE);
    }

    #[test]
    fn host_and_port_accessors() {
        let addr = Address::new("localhost:9001").unwrap();
        assert_eq!(addr.host(), "localhost");
        assert_eq!(addr.port(), 9001);
    }
}
