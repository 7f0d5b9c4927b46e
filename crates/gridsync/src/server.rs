//! `GridServer` builder and server loop.
//!
//! This is the entry point for running a Gridsync server. It ties
//! together all the layers: transport → protocol → registry → engine.

use std::sync::Arc;
use std::time::Duration;

use gridsync_engine::{
    EngineError, EngineHandle, GameState, GameStats, generate_game_id,
    spawn_engine,
};
use gridsync_protocol::{JsonCodec, PlayerId};
use gridsync_registry::{BroadcastRouter, ConnectionRegistry};
use gridsync_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::GridsyncError;
use crate::handler::handle_connection;

/// Tunable server settings, consumed by [`GridServerBuilder`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How long one socket write may take before the connection is
    /// considered wedged and dropped.
    pub send_timeout: Duration,

    /// Close connections that send nothing for this long. `None` (the
    /// default) keeps them open until the peer closes; liveness is then
    /// the client's ping/pong concern.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(10),
            idle_timeout: None,
        }
    }
}

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState {
    pub(crate) registry: Arc<Mutex<ConnectionRegistry>>,
    pub(crate) router: BroadcastRouter,
    pub(crate) engine: EngineHandle,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Gridsync server.
///
/// # Example
///
/// ```rust,ignore
/// use gridsync::prelude::*;
///
/// let server = GridServer::builder()
///     .bind("0.0.0.0:8080")
///     .players(["A", "B"])
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct GridServerBuilder {
    bind_addr: String,
    game_id: Option<String>,
    players: Vec<PlayerId>,
    config: ServerConfig,
}

impl GridServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_id: None,
            players: Vec::new(),
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the game instance id. Defaults to a random one.
    pub fn game_id(mut self, id: impl Into<String>) -> Self {
        self.game_id = Some(id.into());
        self
    }

    /// Sets the turn order for the game.
    pub fn players<I, P>(mut self, players: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.players = players
            .into_iter()
            .map(|p| PlayerId::new(p.into()))
            .collect();
        self
    }

    /// Sets the server configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the server: binds the transport, creates the game, and
    /// spawns the engine actor.
    pub async fn build(self) -> Result<GridServer, GridsyncError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let registry = Arc::new(Mutex::new(ConnectionRegistry::new()));
        let router = BroadcastRouter::new(Arc::clone(&registry));

        let game_id = self.game_id.unwrap_or_else(generate_game_id);
        let state = GameState::new(game_id, self.players);
        tracing::info!(
            game_id = %state.id,
            players = state.players.len(),
            "game created"
        );
        let engine = spawn_engine(state, router.clone());

        Ok(GridServer {
            transport,
            state: Arc::new(ServerState {
                registry,
                router,
                engine,
                codec: JsonCodec,
                config: self.config,
            }),
        })
    }
}

impl Default for GridServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Gridsync server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GridServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl GridServer {
    /// Creates a new builder.
    pub fn builder() -> GridServerBuilder {
        GridServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle for interacting with the game without a
    /// connection. Survives [`run()`](Self::run) taking ownership.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            engine: self.state.engine.clone(),
            router: self.state.router.clone(),
        }
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), GridsyncError> {
        tracing::info!("Gridsync server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Out-of-band access to a running server's game.
///
/// Cheap to clone. Everything here goes through the same engine actor
/// as the connection handlers, so results are always consistent with
/// the broadcast stream.
#[derive(Clone)]
pub struct ServerHandle {
    engine: EngineHandle,
    router: BroadcastRouter,
}

impl ServerHandle {
    /// Returns a snapshot of the current game state.
    pub async fn snapshot(&self) -> Result<GameState, EngineError> {
        self.engine.snapshot().await
    }

    /// Returns derived stats over the current game state.
    pub async fn stats(&self) -> Result<GameStats, EngineError> {
        self.engine.stats().await
    }

    /// Activates a waiting game.
    pub async fn start_game(&self) -> Result<GameState, EngineError> {
        self.engine.start().await
    }

    /// Broadcasts an arbitrary `gameStateUpdate` payload to every
    /// connected client.
    pub async fn broadcast(
        &self,
        payload: serde_json::Value,
    ) -> Result<(), EngineError> {
        self.engine.inject_broadcast(payload).await
    }

    /// Number of currently connected clients.
    pub async fn client_count(&self) -> usize {
        self.router.connection_count().await
    }

    /// Shuts the engine down. Connected clients keep their sockets but
    /// all further moves fail.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.engine.shutdown().await
    }
}
