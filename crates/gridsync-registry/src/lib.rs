//! Connection tracking and broadcast fan-out for Gridsync.
//!
//! This crate owns the answer to "who is connected right now":
//!
//! 1. **Registry** ([`ConnectionRegistry`]) — the live-connection map:
//!    register on accept, bind a player id once it is known, remove on
//!    disconnect (idempotently).
//! 2. **Router** ([`BroadcastRouter`]) — fans an outbound frame out to
//!    every live connection (optionally excluding one, compared by
//!    connection id) or unicasts it to a single connection.
//!
//! Delivery is decoupled from socket writes: each connection has an
//! unbounded channel drained by its own writer task, so a slow peer can
//! never stall the router or another connection, and frames pushed to
//! one connection arrive in push order.

mod connection;
mod error;
mod registry;
mod router;

pub use connection::{Connection, FrameSender, LiveConnection, Liveness};
pub use error::RegistryError;
pub use registry::ConnectionRegistry;
pub use router::BroadcastRouter;
