//! Bellman-Ford relaxation over neighbor-advertised vectors.

use log::debug;
use std::collections::HashMap;

use crate::neighbors::NeighborSet;
use crate::routing_table::{RoutingEntry, RoutingTable};
use crate::types::{link_add, Address};

/// Relax the table against a vector received from `source`.
///
/// Each advertised destination becomes a candidate path through `source` at
/// the link cost plus the advertised cost, saturating at the unreachable
/// sentinel. Returns whether any entry changed. A source that is not a
/// known neighbor contributes nothing.
pub fn apply_vector(
    table: &mut RoutingTable,
    neighbors: &NeighborSet,
    source: &Address,
    vector: &HashMap<Address, RoutingEntry>,
) -> bool {
    let Some(link) = neighbors.cost_of(source) else {
        return false;
    };

    let mut changed = false;
    for (dest, advertised) in vector {
        let candidate = link_add(link, advertised.cost);
        if table.relax(dest, candidate, source) {
            debug!(
                "{}: route to {} is now cost {} via {}",
                table.self_addr(),
                dest,
                candidate,
                source
            );
            changed = true;
        }
    }
    changed
}

/// Re-relax every direct link, restoring neighbor entries the table may be
/// missing. Used by the periodic tick when no vector was received.
pub fn refresh_links(table: &mut RoutingTable, neighbors: &NeighborSet) -> bool {
    let mut changed = false;
    for (addr, &cost) in neighbors.iter() {
        changed |= table.relax(addr, cost, addr);
    }
    changed
}
