//! Per-connection handler: registration, frame routing, and teardown.
//!
//! Each accepted connection gets one reader task (this handler) and one
//! writer task. The flow is:
//!   1. Register the connection with an outbound channel
//!   2. Spawn the writer task draining that channel onto the socket
//!   3. Send the `connection` greeting
//!   4. Loop: receive frames → route moves and pings
//!   5. On exit: unregister and announce the departure to the others

use std::sync::Arc;

use gridsync_engine::{EngineError, GameMove};
use gridsync_protocol::{
    ClientFrame, Codec, ServerFrame, timestamp_ms,
};
use gridsync_registry::RegistryError;
use gridsync_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::GridsyncError;
use crate::server::ServerState;

/// Drop guard that unregisters the connection when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
/// The departure announcement goes to everyone still connected, never
/// back to the closed socket.
struct DisconnectGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let removed = state.registry.lock().await.unregister(conn_id);
            // A repeat unregister announces nothing.
            if removed.is_some() {
                let frame = ServerFrame::Disconnected {
                    message: "A client has disconnected".into(),
                    timestamp: timestamp_ms(),
                };
                state.router.publish(frame, Some(conn_id)).await;
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), GridsyncError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Register and spawn the writer ---
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    state.registry.lock().await.register(conn_id, tx);
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };
    tokio::spawn(write_outbound(conn.clone(), Arc::clone(&state), rx));

    // --- Step 2: Greeting ---
    let greeting = ServerFrame::Connected {
        message: "Connected to game server".into(),
        timestamp: timestamp_ms(),
    };
    state.router.publish_to(greeting, conn_id).await?;

    // --- Step 3: Frame loop ---
    loop {
        let received = match state.config.idle_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, conn.recv()).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::info!(%conn_id, "connection idle, closing");
                        break;
                    }
                }
            }
            None => conn.recv().await,
        };
        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let frame = match state.codec.decode_client(&data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "rejected inbound frame");
                send_error(&state, conn_id, &e.to_string()).await;
                continue;
            }
        };

        match frame {
            ClientFrame::Move { player, x, y, value } => {
                // The connection speaks for whichever player its moves
                // name; remember the latest binding for logging.
                if let Err(RegistryError::NotRegistered(_)) = state
                    .registry
                    .lock()
                    .await
                    .bind_player(conn_id, player.clone())
                {
                    tracing::debug!(%conn_id, "bind raced with disconnect");
                }

                let mv = GameMove {
                    player,
                    x,
                    y,
                    value,
                    timestamp: timestamp_ms(),
                };
                match state.engine.apply_move(mv).await {
                    // The state broadcast the engine already published
                    // is the acknowledgement; nothing extra is unicast.
                    Ok(_) => {}
                    Err(EngineError::Rejected(e)) => {
                        send_error(&state, conn_id, &e.to_string()).await;
                    }
                    Err(e @ EngineError::Unavailable) => {
                        send_error(&state, conn_id, &e.to_string()).await;
                        return Err(e.into());
                    }
                }
            }
            ClientFrame::Ping => {
                let pong = ServerFrame::Pong {
                    timestamp: timestamp_ms(),
                };
                if state.router.publish_to(pong, conn_id).await.is_err() {
                    break;
                }
            }
        }
    }

    // _guard drops here → unregister + departure broadcast.
    Ok(())
}

/// Unicasts an `error` frame; a failure just means the connection is
/// already gone, which the frame loop will notice on its own.
async fn send_error(state: &Arc<ServerState>, conn_id: ConnectionId, message: &str) {
    let frame = ServerFrame::Error {
        message: message.to_string(),
        timestamp: timestamp_ms(),
    };
    if let Err(e) = state.router.publish_to(frame, conn_id).await {
        tracing::debug!(%conn_id, error = %e, "error frame not delivered");
    }
}

/// Writer task: drains the connection's outbound channel onto the
/// socket, in order. Exits when the channel closes (the registry entry
/// was removed) or a write fails or times out. A slow consumer only
/// ever blocks its own writer; everyone else's frames keep flowing.
///
/// A write failure unregisters the connection right here rather than
/// waiting for the reader to notice the closed socket, so a wedged peer
/// leaves the client count as soon as its timeout fires. The repeat
/// unregister from the reader's guard is then a no-op.
async fn write_outbound(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
    mut rx: tokio::sync::mpsc::UnboundedReceiver<ServerFrame>,
) {
    let conn_id = conn.id();
    let send_timeout = state.config.send_timeout;

    while let Some(frame) = rx.recv().await {
        let bytes = match state.codec.encode(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "outbound encode failed");
                continue;
            }
        };

        match tokio::time::timeout(send_timeout, conn.send(&bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "write failed");
                break;
            }
            Err(_) => {
                tracing::warn!(%conn_id, "write timed out, dropping connection");
                break;
            }
        }
    }

    let removed = state.registry.lock().await.unregister(conn_id);
    if removed.is_some() {
        let frame = ServerFrame::Disconnected {
            message: "A client has disconnected".into(),
            timestamp: timestamp_ms(),
        };
        state.router.publish(frame, Some(conn_id)).await;
    }

    // The close handshake gets the same bound as any other write; a
    // wedged peer must not pin this task.
    let _ = tokio::time::timeout(send_timeout, conn.close()).await;
    tracing::debug!(%conn_id, "writer task exited");
}
