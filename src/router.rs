//! A single running router: its state, socket, and concurrent activities.

use log::{info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::broadcast::{bind_reusable, broadcast_vector};
use crate::error::FabricError;
use crate::neighbors::NeighborSet;
use crate::route_manager;
use crate::routing_table::{RoutingEntry, RoutingTable};
use crate::tasks;
use crate::types::{Address, Cost};

/// Everything guarded by the router's single lock. The neighbor set and
/// the routing table always mutate together, so they share it.
#[derive(Debug)]
pub struct RouterState {
    pub neighbors: NeighborSet,
    pub table: RoutingTable,
}

/// A running router. Owns the receive socket (through its receiver task),
/// the shutdown signal, and the receiver and tick activities.
pub struct Router {
    addr: Address,
    local: SocketAddr,
    state: Arc<Mutex<RouterState>>,
    shutdown: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Router {
    /// Seed the table, bind the receive socket, and launch the receiver
    /// and tick activities. A bind failure is fatal: no router exists
    /// afterwards.
    pub async fn start(
        addr: Address,
        initial_neighbors: Vec<(Address, Cost)>,
        tick_interval: Duration,
    ) -> Result<Arc<Self>, FabricError> {
        let mut neighbors = NeighborSet::new();
        let mut table = RoutingTable::new(addr.clone());
        for (neighbor, cost) in initial_neighbors {
            if neighbor == addr {
                return Err(FabricError::InvalidArgument(format!(
                    "router {addr} cannot have itself as a neighbor"
                )));
            }
            neighbors.insert(neighbor.clone(), cost);
            table.relax(&neighbor, cost, &neighbor);
        }

        let local = addr.resolve()?;
        let socket = bind_reusable(&local).map_err(|source| FabricError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        let (shutdown, _) = broadcast::channel(1);
        let state = Arc::new(Mutex::new(RouterState { neighbors, table }));
        let socket = Arc::new(socket);

        let receiver = tokio::spawn(tasks::receive_loop(
            state.clone(),
            socket,
            local,
            shutdown.subscribe(),
        ));
        let ticker = tokio::spawn(tasks::tick_loop(
            state.clone(),
            local,
            tick_interval,
            shutdown.subscribe(),
        ));

        info!("router {addr} listening on {local}");

        Ok(Arc::new(Self {
            addr,
            local,
            state,
            shutdown,
            tasks: Mutex::new(vec![receiver, ticker]),
        }))
    }

    pub fn addr(&self) -> &Address {
        &self.addr
    }

    /// Add a direct link to `peer` and relax. Broadcasts when the table
    /// changed. The facade calls this on both endpoints of a link.
    pub async fn connect(&self, peer: Address, cost: Cost) -> Result<bool, FabricError> {
        if peer == self.addr {
            return Err(FabricError::InvalidArgument(format!(
                "router {} cannot link to itself",
                self.addr
            )));
        }

        let (changed, snapshot, neighbors) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            state.neighbors.insert(peer.clone(), cost);
            let mut changed = state.table.relax(&peer, cost, &peer);
            changed |= route_manager::refresh_links(&mut state.table, &state.neighbors);
            (changed, state.table.snapshot(), state.neighbors.addresses())
        };

        if changed {
            info!("router {}: linked to {peer} at cost {cost}", self.addr);
            broadcast_vector(&self.local, &snapshot, &neighbors).await;
        }
        Ok(changed)
    }

    /// Consistent copy of the routing table.
    pub async fn routes(&self) -> HashMap<Address, RoutingEntry> {
        self.state.lock().await.table.snapshot()
    }

    /// Signal both activities and wait for them to drain. The receive
    /// socket closes when the receiver task drops it.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(());
        let handles: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("router {}: task aborted: {e}", self.addr);
            }
        }
        info!("router {} stopped", self.addr);
    }
}
