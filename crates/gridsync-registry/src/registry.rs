//! The connection registry: tracks every live connection.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is NOT thread-safe by itself — it is a plain
//! `HashMap` owned behind a single `tokio::sync::Mutex` at the server
//! layer. Register/unregister are each atomic because they happen under
//! that one lock; snapshots taken under the lock can therefore never
//! contain a connection that was removed before the snapshot.

use std::collections::HashMap;

use gridsync_protocol::PlayerId;
use gridsync_transport::ConnectionId;

use crate::{Connection, FrameSender, LiveConnection, Liveness, RegistryError};

/// Tracks all live connections and their optional player bindings.
///
/// Lifecycle of an entry:
///
/// ```text
/// register() ──→ [Connected, player: None]
///                     │ bind_player()
///                     ▼
///                [Connected, player: Some]
///                     │ unregister()
///                     ▼
///                 (removed)
/// ```
///
/// Connections live and die independently of the game: the game keeps
/// existing with zero connections, and a connection may never bind a
/// player at all.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Registers a newly accepted connection with its outbound channel.
    ///
    /// The entry starts live with no player bound. Transport ids are
    /// unique, so a colliding id means a stale entry from an unclean
    /// teardown — it is replaced and logged.
    pub fn register(
        &mut self,
        id: ConnectionId,
        sender: FrameSender,
    ) -> &Connection {
        if self.connections.contains_key(&id) {
            tracing::warn!(%id, "replacing stale registry entry");
        }
        self.connections.insert(id, Connection::new(id, sender));
        tracing::info!(%id, total = self.connections.len(), "connection registered");
        // Just inserted above.
        self.connections.get(&id).expect("just inserted")
    }

    /// Binds a player id to a registered connection.
    ///
    /// Rebinding to a different player is allowed and just updates the
    /// record — identity issuance is not this layer's concern.
    ///
    /// # Errors
    /// [`RegistryError::NotRegistered`] if the connection is unknown or
    /// already removed. Callers log and ignore this; it is a benign
    /// race with disconnection, not a fault.
    pub fn bind_player(
        &mut self,
        id: ConnectionId,
        player: PlayerId,
    ) -> Result<(), RegistryError> {
        let conn = self
            .connections
            .get_mut(&id)
            .ok_or(RegistryError::NotRegistered(id))?;
        if conn.player.as_ref() != Some(&player) {
            tracing::info!(%id, %player, "player bound to connection");
            conn.player = Some(player);
        }
        Ok(())
    }

    /// Removes a connection. Idempotent: removing an id that is absent
    /// (or was already removed) is a no-op, not an error.
    ///
    /// Returns the removed record so the caller can announce the
    /// departure, or `None` on a repeat call.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Connection> {
        let mut conn = self.connections.remove(&id)?;
        conn.liveness = Liveness::Closed;
        tracing::info!(
            %id,
            player = conn.player.as_ref().map(|p| p.as_str()).unwrap_or("-"),
            total = self.connections.len(),
            "connection unregistered"
        );
        Some(conn)
    }

    /// Snapshot of every live connection at this instant.
    ///
    /// The snapshot never includes connections removed before this call;
    /// a connection that dies afterwards simply fails its send.
    pub fn live_connections(&self) -> Vec<LiveConnection> {
        self.connections
            .values()
            .filter(|c| c.is_live())
            .map(|c| LiveConnection {
                id: c.id,
                sender: c.sender.clone(),
            })
            .collect()
    }

    /// Looks up a connection record by id.
    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Number of registered connections.
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if nothing is connected.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
