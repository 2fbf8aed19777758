//! Directly attached links.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::types::{Address, Cost};

/// The router's direct neighbors and their link costs.
#[derive(Debug, Clone, Default)]
pub struct NeighborSet {
    links: HashMap<Address, Cost>,
}

impl NeighborSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a link. Returns the previous cost, if any.
    pub fn insert(&mut self, addr: Address, cost: Cost) -> Option<Cost> {
        self.links.insert(addr, cost)
    }

    pub fn cost_of(&self, addr: &Address) -> Option<Cost> {
        self.links.get(addr).copied()
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.links.contains_key(addr)
    }

    /// Attribute an inbound datagram to a known neighbor, if any.
    pub fn identify(&self, src: &SocketAddr) -> Option<Address> {
        self.links.keys().find(|a| a.matches_source(src)).cloned()
    }

    /// Neighbor addresses for broadcast fan-out.
    pub fn addresses(&self) -> Vec<Address> {
        self.links.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Cost)> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
