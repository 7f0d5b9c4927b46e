//! Connection records: what the registry knows about one connection.

use gridsync_protocol::{PlayerId, ServerFrame};
use gridsync_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::RegistryError;

/// Channel end for queueing outbound frames to one connection.
///
/// The receiving half lives in that connection's writer task. Unbounded
/// on purpose: pushing a frame never blocks the publisher; backpressure
/// against a dead peer is handled by the writer task's send timeout,
/// which tears the connection down.
pub type FrameSender = mpsc::UnboundedSender<ServerFrame>;

/// Whether a connection can still receive frames.
///
/// A connection never outlives its transport: `Closed` is a transient
/// state on the way out of the registry, so snapshots taken while a
/// removal is in flight don't see a half-dead entry as live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// The transport is open and the writer task is draining frames.
    Connected,
    /// The transport closed; the entry is about to be removed.
    Closed,
}

/// The registry's record of one connection.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Identity key; all comparison and exclusion goes through this.
    pub id: ConnectionId,

    /// The player this connection speaks for. `None` until the first
    /// frame that names a player arrives — a connection may watch the
    /// game without ever binding.
    pub player: Option<PlayerId>,

    /// Current liveness.
    pub liveness: Liveness,

    pub(crate) sender: FrameSender,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, sender: FrameSender) -> Self {
        Self {
            id,
            player: None,
            liveness: Liveness::Connected,
            sender,
        }
    }

    /// Returns `true` if this connection can still receive frames.
    pub fn is_live(&self) -> bool {
        self.liveness == Liveness::Connected
    }
}

/// A point-in-time view of one live connection, handed out by
/// [`ConnectionRegistry::live_connections`](crate::ConnectionRegistry::live_connections).
///
/// Holding one does not keep the connection alive; a send may fail if
/// the connection died after the snapshot was taken.
#[derive(Debug, Clone)]
pub struct LiveConnection {
    pub id: ConnectionId,
    pub(crate) sender: FrameSender,
}

impl LiveConnection {
    /// Queues a frame for delivery.
    ///
    /// # Errors
    /// [`RegistryError::DeliveryFailed`] if the writer task is gone.
    pub fn send(&self, frame: ServerFrame) -> Result<(), RegistryError> {
        self.sender
            .send(frame)
            .map_err(|_| RegistryError::DeliveryFailed(self.id))
    }
}
