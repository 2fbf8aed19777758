//! Distance-vector routing fabric.
//!
//! Each router learns shortest paths to every reachable address by
//! exchanging its routing table with directly attached neighbors over UDP
//! and running a Bellman-Ford relaxation against received vectors. It
//! rebroadcasts whenever relaxation changes the table, and retransmits the
//! table unconditionally on every periodic tick so that lost datagrams are
//! recovered. The [`fabric::Fabric`] handle owns the running routers and
//! exposes the start/stop/connect/routes admission operations;
//! [`control_server::ControlServer`] serves them over TCP.

pub mod broadcast;
pub mod config;
pub mod control_server;
pub mod error;
pub mod fabric;
pub mod messages;
pub mod neighbors;
pub mod route_manager;
pub mod router;
pub mod routing_table;
pub mod tasks;
pub mod types;

pub use config::FabricConfig;
pub use error::FabricError;
pub use fabric::{Fabric, NeighborSpec};
pub use neighbors::NeighborSet;
pub use router::Router;
pub use routing_table::{RoutingEntry, RoutingTable};
pub use types::{Address, Cost, UNREACHABLE};
