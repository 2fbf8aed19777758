//! Best-effort advertisement fan-out to direct neighbors.

use log::{debug, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

use crate::messages;
use crate::routing_table::RoutingEntry;
use crate::types::Address;

/// Bind a datagram socket to `addr` with address reuse enabled.
///
/// Both the long-lived receive socket and the transient broadcast sockets
/// bind the router's own address, so every datagram a neighbor sees carries
/// the canonical source and can be attributed to a known neighbor.
pub fn bind_reusable(addr: &SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&(*addr).into())?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

/// Send the table snapshot to each neighbor once. No retries; send and
/// encode failures are logged and swallowed, and the periodic tick
/// retransmits later. Holds no lock: callers pass an owned snapshot.
pub async fn broadcast_vector(
    local: &SocketAddr,
    snapshot: &HashMap<Address, RoutingEntry>,
    neighbors: &[Address],
) {
    let payload = match messages::encode_vector(snapshot) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("{local}: dropping broadcast: {e}");
            return;
        }
    };

    for neighbor in neighbors {
        let target = match neighbor.resolve() {
            Ok(target) => target,
            Err(e) => {
                warn!("{local}: cannot broadcast to {neighbor}: {e}");
                continue;
            }
        };
        // One ephemeral socket per recipient, closed on drop.
        let socket = match bind_reusable(local) {
            Ok(socket) => socket,
            Err(e) => {
                warn!("{local}: failed to open broadcast socket: {e}");
                continue;
            }
        };
        match socket.send_to(&payload, target).await {
            Ok(n) => debug!("{local}: sent {n} bytes to {neighbor}"),
            Err(e) => warn!("{local}: failed to send update to {neighbor}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reusable_sockets_share_an_address() {
        let a = bind_reusable(&"127.0.0.1:0".parse().unwrap()).unwrap();
        let bound = a.local_addr().unwrap();
        // A second bind to the same address must succeed while the first
        // socket is still alive.
        let b = bind_reusable(&bound).unwrap();
        assert_eq!(b.local_addr().unwrap(), bound);
    }

    #[tokio::test]
    async fn broadcast_reaches_a_bound_receiver() {
        let receiver = bind_reusable(&"127.0.0.1:0".parse().unwrap()).unwrap();
        let receiver_addr = receiver.local_addr().unwrap();
        // Keep a socket alive on the sender address: the broadcast socket
        // must still bind beside it, exactly as it does beside the receive
        // socket of a running router.
        let sender = bind_reusable(&"127.0.0.1:0".parse().unwrap()).unwrap();
        let sender_addr = sender.local_addr().unwrap();

        let me = Address::new(format!("127.0.0.1:{}", sender_addr.port())).unwrap();
        let mut snapshot = HashMap::new();
        snapshot.insert(
            me.clone(),
            RoutingEntry {
                cost: 0,
                next_hop: me,
            },
        );
        let target = Address::new(format!("127.0.0.1:{}", receiver_addr.port())).unwrap();

        broadcast_vector(&sender_addr, &snapshot, &[target]).await;

        let mut buf = vec![0u8; messages::RECV_BUFFER];
        let (len, src) = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            receiver.recv_from(&mut buf),
        )
        .await
        .expect("timed out waiting for broadcast")
        .unwrap();
        // The datagram carries the canonical source address.
        assert_eq!(src, sender_addr);
        assert!(messages::decode_vector(&buf[..len]).is_ok());
    }
}
