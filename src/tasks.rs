//! Long-lived router activities: the receive loop and the periodic tick.
//!
//! Both are parked on the router's shutdown channel and exit within one
//! poll of it being signalled.

use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, Mutex};
use tokio::time::interval;

use crate::broadcast::broadcast_vector;
use crate::messages;
use crate::route_manager;
use crate::router::RouterState;

/// Read datagrams, relax the table against each decoded vector, and
/// rebroadcast when anything changed.
pub async fn receive_loop(
    state: Arc<Mutex<RouterState>>,
    socket: Arc<UdpSocket>,
    local: SocketAddr,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut buf = vec![0u8; messages::RECV_BUFFER];
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("{local}: receive loop shutting down");
                break;
            }
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, src)) => handle_datagram(&state, &local, &buf[..len], src).await,
                Err(e) => {
                    warn!("{local}: receive error: {e}");
                    // Back off briefly so a persistent error cannot spin.
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

async fn handle_datagram(
    state: &Arc<Mutex<RouterState>>,
    local: &SocketAddr,
    data: &[u8],
    src: SocketAddr,
) {
    let vector = match messages::decode_vector(data) {
        Ok(vector) => vector,
        Err(e) => {
            warn!("{local}: dropping malformed advertisement from {src}: {e}");
            return;
        }
    };

    // Relax under the lock, then broadcast outside it.
    let rebroadcast = {
        let mut guard = state.lock().await;
        let state = &mut *guard;
        let Some(source) = state.neighbors.identify(&src) else {
            debug!("{local}: ignoring advertisement from unknown source {src}");
            return;
        };
        debug!("{local}: received {} routes from {source}", vector.len());
        if route_manager::apply_vector(&mut state.table, &state.neighbors, &source, &vector) {
            info!("{local}: table updated by advertisement from {source}");
            Some((state.table.snapshot(), state.neighbors.addresses()))
        } else {
            None
        }
    };

    if let Some((snapshot, neighbors)) = rebroadcast {
        broadcast_vector(local, &snapshot, &neighbors).await;
    }
}

/// Refresh direct-link entries and retransmit the table every period.
///
/// The retransmission is unconditional: it is what recovers neighbors from
/// lost datagrams, so it must not depend on the local table having changed.
pub async fn tick_loop(
    state: Arc<Mutex<RouterState>>,
    local: SocketAddr,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period);
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("{local}: tick loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let (snapshot, neighbors, changed) = {
                    let mut guard = state.lock().await;
                    let state = &mut *guard;
                    let changed =
                        route_manager::refresh_links(&mut state.table, &state.neighbors);
                    (state.table.snapshot(), state.neighbors.addresses(), changed)
                };
                if changed {
                    info!("{local}: periodic refresh changed the table");
                }
                if neighbors.is_empty() {
                    continue;
                }
                broadcast_vector(&local, &snapshot, &neighbors).await;
            }
        }
    }
}
