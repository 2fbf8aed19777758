//! Wire codec for advertised routing vectors.
//!
//! A datagram carries one JSON object mapping destination addresses to
//! `{"cost": .., "next_hop": ".."}` entries. No framing header.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::FabricError;
use crate::routing_table::RoutingEntry;
use crate::types::{Address, Cost};

/// Hard cap on one advertisement datagram.
pub const MAX_DATAGRAM: usize = 4096;

/// Receive buffer size. Larger datagrams are truncated by the kernel and
/// then rejected as malformed JSON.
pub const RECV_BUFFER: usize = 64 * 1024;

/// Entry exactly as it appears on the wire, before address validation.
#[derive(Debug, Serialize, Deserialize)]
struct WireEntry {
    cost: Cost,
    next_hop: String,
}

/// Serialize a table snapshot for broadcast.
pub fn encode_vector(vector: &HashMap<Address, RoutingEntry>) -> Result<Vec<u8>, FabricError> {
    let payload = serde_json::to_vec(vector)?;
    if payload.len() > MAX_DATAGRAM {
        return Err(FabricError::Oversize(payload.len()));
    }
    Ok(payload)
}

/// Parse a received datagram into an advertised vector.
///
/// Every destination and next hop must be a well-formed `host:port`
/// address; otherwise the whole payload is rejected.
pub fn decode_vector(data: &[u8]) -> Result<HashMap<Address, RoutingEntry>, FabricError> {
    let raw: HashMap<String, WireEntry> = serde_json::from_slice(data)?;
    let mut vector = HashMap::with_capacity(raw.len());
    for (dest, entry) in raw {
        let dest = Address::new(dest)?;
        let next_hop = Address::new(entry.next_hop)?;
        vector.insert(
            dest,
            RoutingEntry {
                cost: entry.cost,
                next_hop,
            },
        );
    }
    Ok(vector)
}
