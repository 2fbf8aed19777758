//! Error taxonomy for the fabric.
//!
//! Argument, lookup, and conflict errors surface to the admission caller.
//! Codec and i/o errors inside the receive and broadcast loops are
//! transient: logged and swallowed, never surfaced. A bind failure at
//! start is the one fatal case.

use std::io;
use thiserror::Error;

use crate::messages::MAX_DATAGRAM;

#[derive(Debug, Error)]
pub enum FabricError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no router on port {0}")]
    NotFound(u16),

    #[error("router already running on port {0}")]
    Conflict(u16),

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("vector of {0} bytes exceeds the {max}-byte datagram limit", max = MAX_DATAGRAM)]
    Oversize(usize),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
