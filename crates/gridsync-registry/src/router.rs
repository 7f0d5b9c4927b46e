//! The broadcast router: fans one frame out to many connections.

use std::sync::Arc;

use gridsync_protocol::ServerFrame;
use gridsync_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::{ConnectionRegistry, RegistryError};

/// Fans outbound frames out through the connection registry.
///
/// Cheap to clone — it is an `Arc` around the shared registry. The
/// engine actor, the connection handlers, and the public server handle
/// each hold one.
///
/// Ordering contract: a `publish` queues the frame on every recipient's
/// channel before returning, so two awaited publishes in sequence reach
/// each individual connection in that sequence. Across different
/// connections no order is promised.
#[derive(Clone)]
pub struct BroadcastRouter {
    registry: Arc<Mutex<ConnectionRegistry>>,
}

impl BroadcastRouter {
    /// Creates a router over a shared registry.
    pub fn new(registry: Arc<Mutex<ConnectionRegistry>>) -> Self {
        Self { registry }
    }

    /// Delivers `frame` to every live connection except `excluding`.
    ///
    /// Exclusion is by connection id, never by object identity. A
    /// connection whose channel is gone is unregistered on the spot;
    /// its failure does not affect delivery to the others. Returns the
    /// number of connections the frame was queued for.
    pub async fn publish(
        &self,
        frame: ServerFrame,
        excluding: Option<ConnectionId>,
    ) -> usize {
        let mut registry = self.registry.lock().await;

        let mut delivered = 0;
        let mut dead: Vec<ConnectionId> = Vec::new();
        for conn in registry.live_connections() {
            if Some(conn.id) == excluding {
                continue;
            }
            if conn.send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(conn.id);
            }
        }

        for id in dead {
            tracing::warn!(%id, "dropping connection with closed channel");
            registry.unregister(id);
        }

        tracing::debug!(delivered, "broadcast frame");
        delivered
    }

    /// Delivers `frame` to exactly one connection.
    ///
    /// The unicast path for validation errors, pongs, and direct
    /// acknowledgements.
    ///
    /// # Errors
    /// - [`RegistryError::NotRegistered`] — the connection is gone.
    /// - [`RegistryError::DeliveryFailed`] — its channel is closed; the
    ///   connection is unregistered as a side effect.
    pub async fn publish_to(
        &self,
        frame: ServerFrame,
        id: ConnectionId,
    ) -> Result<(), RegistryError> {
        let mut registry = self.registry.lock().await;

        let conn = registry
            .get(&id)
            .ok_or(RegistryError::NotRegistered(id))?;
        if !conn.is_live() {
            return Err(RegistryError::NotRegistered(id));
        }

        let sender = conn.sender.clone();
        if sender.send(frame).is_err() {
            tracing::warn!(%id, "unicast failed, dropping connection");
            registry.unregister(id);
            return Err(RegistryError::DeliveryFailed(id));
        }
        Ok(())
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.registry.lock().await.count()
    }
}

// =========================================================================
// Tests
// =========================================================================
