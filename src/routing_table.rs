//! The per-router routing table and its relaxation rule.

use serde::Serialize;
use std::collections::HashMap;

use crate::types::{Address, Cost, UNREACHABLE};

/// Best known path to one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingEntry {
    pub cost: Cost,
    pub next_hop: Address,
}

/// Destination to best-path map. Always contains the router's own address
/// at cost zero, routed through itself.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    self_addr: Address,
    entries: HashMap<Address, RoutingEntry>,
}

impl RoutingTable {
    pub fn new(self_addr: Address) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            self_addr.clone(),
            RoutingEntry {
                cost: 0,
                next_hop: self_addr.clone(),
            },
        );
        Self { self_addr, entries }
    }

    pub fn self_addr(&self) -> &Address {
        &self.self_addr
    }

    /// Install the candidate path if it is strictly cheaper, or equally
    /// cheap through a lexicographically smaller next hop. Returns whether
    /// the table changed.
    ///
    /// The self entry is never replaced, and candidates at or above the
    /// unreachable sentinel are never installed.
    pub fn relax(&mut self, dest: &Address, cost: Cost, next_hop: &Address) -> bool {
        if *dest == self.self_addr || cost >= UNREACHABLE {
            return false;
        }
        if let Some(current) = self.entries.get(dest) {
            if cost > current.cost {
                return false;
            }
            if cost == current.cost && *next_hop >= current.next_hop {
                return false;
            }
        }
        self.entries.insert(
            dest.clone(),
            RoutingEntry {
                cost,
                next_hop: next_hop.clone(),
            },
        );
        true
    }

    pub fn get(&self, dest: &Address) -> Option<&RoutingEntry> {
        self.entries.get(dest)
    }

    /// Current best cost to `dest`, or the unreachable sentinel.
    pub fn cost_to(&self, dest: &Address) -> Cost {
        self.entries.get(dest).map(|e| e.cost).unwrap_or(UNREACHABLE)
    }

    /// Consistent copy of every entry, for serialization outside the lock.
    pub fn snapshot(&self) -> HashMap<Address, RoutingEntry> {
        self.entries.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &RoutingEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn table() -> RoutingTable {
        RoutingTable::new(addr("localhost:9001"))
    }

    #[test]
    fn seeds_self_entry() {
        let table = table();
        let me = addr("localhost:9001");
        assert_eq!(
            table.get(&me),
            Some(&RoutingEntry {
                cost: 0,
                next_hop: me.clone()
            })
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn installs_strictly_cheaper_path() {
        let mut table = table();
        let dest = addr("localhost:9003");
        let via_a = addr("localhost:9002");
        let via_b = addr("localhost:9004");

        assert!(table.relax(&dest, 10, &via_b));
        assert!(table.relax(&dest, 4, &via_a));
        assert_eq!(table.get(&dest).unwrap().cost, 4);
        assert_eq!(table.get(&dest).unwrap().next_hop, via_a);
        // Worse candidate leaves the table alone.
        assert!(!table.relax(&dest, 5, &via_b));
        assert_eq!(table.get(&dest).unwrap().cost, 4);
    }

    #[test]
    fn equal_cost_prefers_smaller_next_hop() {
        let mut table = table();
        let dest = addr("localhost:9004");
        let high = addr("localhost:9003");
        let low = addr("localhost:9002");

        assert!(table.relax(&dest, 2, &high));
        assert!(table.relax(&dest, 2, &low));
        assert_eq!(table.get(&dest).unwrap().next_hop, low);
        // The larger hop never wins back at equal cost.
        assert!(!table.relax(&dest, 2, &high));
        assert_eq!(table.get(&dest).unwrap().next_hop, low);
    }

    #[test]
    fn equal_cost_same_hop_is_no_change() {
        let mut table = table();
        let dest = addr("localhost:9002");
        assert!(table.relax(&dest, 5, &dest));
        assert!(!table.relax(&dest, 5, &dest));
    }

    #[test]
    fn self_entry_is_never_relaxed() {
        let mut table = table();
        let me = addr("localhost:9001");
        let other = addr("localhost:9000");
        // Even a zero-cost candidate through a smaller hop is refused.
        assert!(!table.relax(&me, 0, &other));
        assert_eq!(table.get(&me).unwrap().next_hop, me);
    }

    #[test]
    fn unreachable_candidates_are_not_installed() {
        let mut table = table();
        let dest = addr("localhost:9005");
        let via = addr("localhost:9002");
        assert!(!table.relax(&dest, UNREACHABLE, &via));
        assert!(table.get(&dest).is_none());
        assert_eq!(table.cost_to(&dest), UNREACHABLE);
    }
}
