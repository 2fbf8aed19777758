//! Process-wide admission facade over the router index.
//!
//! Translates raw start/stop/connect/routes requests into router lifecycle
//! calls. Any transport can drive it; the control server is one.

use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::FabricConfig;
use crate::error::FabricError;
use crate::router::Router;
use crate::routing_table::RoutingEntry;
use crate::types::{Address, Cost, UNREACHABLE};

/// Neighbor description exactly as submitted on the admission surface,
/// validated by [`Fabric::start_router`].
#[derive(Debug, Clone, Deserialize)]
pub struct NeighborSpec {
    pub address: String,
    pub cost: i64,
}

/// Owns every running router, keyed by port. The index lock guards only
/// map operations, never router I/O.
pub struct Fabric {
    config: FabricConfig,
    routers: Mutex<HashMap<u16, Arc<Router>>>,
}

impl Fabric {
    pub fn new(config: FabricConfig) -> Self {
        Self {
            config,
            routers: Mutex::new(HashMap::new()),
        }
    }

    /// Instantiate and run a router. Refuses occupied ports; a router that
    /// fails to start leaves no index entry.
    pub async fn start_router(
        &self,
        port: i64,
        neighbors: Vec<NeighborSpec>,
    ) -> Result<(), FabricError> {
        let port = validate_port(port)?;

        let mut initial = Vec::with_capacity(neighbors.len());
        for spec in neighbors {
            let neighbor = Address::new(spec.address)?;
            if neighbor.port() == port {
                return Err(FabricError::InvalidArgument(format!(
                    "neighbor {neighbor} uses the router's own port"
                )));
            }
            initial.push((neighbor, validate_cost(spec.cost)?));
        }

        {
            let routers = self.routers.lock().await;
            if routers.contains_key(&port) {
                return Err(FabricError::Conflict(port));
            }
        }

        // Bind outside the index lock.
        let addr = Address::from_host_port(&self.config.host, port);
        let router = Router::start(addr, initial, self.tick_interval()).await?;

        let mut routers = self.routers.lock().await;
        if routers.contains_key(&port) {
            // Lost a start race for the same port; back out the new router.
            drop(routers);
            router.stop().await;
            return Err(FabricError::Conflict(port));
        }
        routers.insert(port, router);
        info!("started router on port {port}");
        Ok(())
    }

    /// Stop a router and release its port. The index entry is removed
    /// before the router drains, so the port is immediately reusable.
    pub async fn stop_router(&self, port: i64) -> Result<(), FabricError> {
        let port = validate_port(port)?;
        let router = self
            .routers
            .lock()
            .await
            .remove(&port)
            .ok_or(FabricError::NotFound(port))?;
        router.stop().await;
        info!("stopped router on port {port}");
        Ok(())
    }

    /// Add a bidirectional link between two running routers. Partial
    /// failure is reported without rollback.
    pub async fn connect(&self, port1: i64, port2: i64, cost: i64) -> Result<(), FabricError> {
        let port1 = validate_port(port1)?;
        let port2 = validate_port(port2)?;
        let cost = validate_cost(cost)?;
        if port1 == port2 {
            return Err(FabricError::InvalidArgument(format!(
                "cannot connect port {port1} to itself"
            )));
        }

        let (first, second) = {
            let routers = self.routers.lock().await;
            let first = routers
                .get(&port1)
                .cloned()
                .ok_or(FabricError::NotFound(port1))?;
            let second = routers
                .get(&port2)
                .cloned()
                .ok_or(FabricError::NotFound(port2))?;
            (first, second)
        };

        first.connect(second.addr().clone(), cost).await?;
        second.connect(first.addr().clone(), cost).await?;
        info!("connected {} and {} at cost {cost}", first.addr(), second.addr());
        Ok(())
    }

    /// Snapshot of a router's current table.
    pub async fn routes(
        &self,
        port: i64,
    ) -> Result<HashMap<Address, RoutingEntry>, FabricError> {
        let port = validate_port(port)?;
        let router = self
            .routers
            .lock()
            .await
            .get(&port)
            .cloned()
            .ok_or(FabricError::NotFound(port))?;
        Ok(router.routes().await)
    }

    /// Stop every router. Used on process shutdown.
    pub async fn shutdown(&self) {
        let routers: Vec<_> = self.routers.lock().await.drain().collect();
        for (_, router) in routers {
            router.stop().await;
        }
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.config.tick_interval_secs)
    }
}

fn validate_port(port: i64) -> Result<u16, FabricError> {
    u16::try_from(port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| {
            FabricError::InvalidArgument(format!("invalid port {port}: must be 1..=65535"))
        })
}

fn validate_cost(cost: i64) -> Result<Cost, FabricError> {
    if cost < 0 {
        return Err(FabricError::InvalidArgument(format!(
            "invalid cost {cost}: must be non-negative"
        )));
    }
    // Anything at or past the sentinel is already "no path".
    Ok(Cost::try_from(cost).unwrap_or(UNREACHABLE).min(UNREACHABLE))
}
