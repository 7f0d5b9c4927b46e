//! Error types for the registry layer.

use gridsync_transport::ConnectionId;

/// Errors that can occur during registry and routing operations.
///
/// None of these are fatal: an inconsistency is logged and ignored by
/// callers, and a delivery failure removes exactly one connection.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The connection id is not (or no longer) in the registry.
    /// Typically a bind or unicast raced with a disconnect.
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),

    /// A frame could not be queued — the connection's writer task is
    /// gone. The connection is unregistered as a side effect.
    #[error("delivery to connection {0} failed")]
    DeliveryFailed(ConnectionId),
}
