//! Engine actor: an isolated Tokio task that owns the authoritative
//! game state.
//!
//! Every mutation of the game flows through this task's command
//! channel, so concurrent move submissions are serialized. The actor
//! applies each move and publishes the resulting snapshot before it
//! picks up the next command, which means the second of two racing
//! moves always validates against a grid that already contains the
//! first.

use gridsync_protocol::{ServerFrame, timestamp_ms};
use gridsync_registry::BroadcastRouter;
use tokio::sync::{mpsc, oneshot};

use crate::{EngineError, GameMove, GameState, GameStats, MoveError, rules};

/// Command channel size for the engine actor.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Commands sent to the engine actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/reply: the caller
/// sends the command and awaits the answer on that channel.
enum EngineCommand {
    /// Validate and apply one move.
    Apply {
        mv: GameMove,
        reply: oneshot::Sender<Result<GameState, MoveError>>,
    },

    /// Transition a waiting game to active.
    Start {
        reply: oneshot::Sender<GameState>,
    },

    /// Request the current state snapshot.
    Snapshot {
        reply: oneshot::Sender<GameState>,
    },

    /// Request derived stats over the current state.
    Stats {
        reply: oneshot::Sender<GameStats>,
    },

    /// Broadcast an arbitrary payload to all live connections.
    Inject { payload: serde_json::Value },

    /// Shut down the engine.
    Shutdown,
}

/// Handle to the running engine actor. Cheap to clone; every
/// connection handler holds one.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Submits a move for validation and application.
    ///
    /// On success, the returned state is the snapshot that was
    /// broadcast to all live connections; the broadcast has already
    /// been handed to every connection's outbound queue by the time
    /// this returns. A rejection broadcasts nothing.
    ///
    /// # Errors
    /// [`EngineError::Rejected`] when the move fails validation,
    /// [`EngineError::Unavailable`] when the actor is gone.
    pub async fn apply_move(&self, mv: GameMove) -> Result<GameState, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::Apply { mv, reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable)?;
        let result = reply_rx.await.map_err(|_| EngineError::Unavailable)?;
        Ok(result?)
    }

    /// Activates a waiting game, returning the resulting snapshot.
    pub async fn start(&self) -> Result<GameState, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::Start { reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable)?;
        reply_rx.await.map_err(|_| EngineError::Unavailable)
    }

    /// Returns a snapshot of the current game state.
    ///
    /// Served by the actor itself, so the snapshot is consistent with
    /// the broadcast stream: it never shows a half-applied move.
    pub async fn snapshot(&self) -> Result<GameState, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable)?;
        reply_rx.await.map_err(|_| EngineError::Unavailable)
    }

    /// Returns derived stats over the current state.
    pub async fn stats(&self) -> Result<GameStats, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::Stats { reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable)?;
        reply_rx.await.map_err(|_| EngineError::Unavailable)
    }

    /// Broadcasts an out-of-band `gameStateUpdate` payload to every
    /// live connection (fire-and-forget). The payload is delivered
    /// as-is; the game state is not consulted or modified.
    pub async fn inject_broadcast(
        &self,
        payload: serde_json::Value,
    ) -> Result<(), EngineError> {
        self.sender
            .send(EngineCommand::Inject { payload })
            .await
            .map_err(|_| EngineError::Unavailable)
    }

    /// Tells the engine to shut down.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.sender
            .send(EngineCommand::Shutdown)
            .await
            .map_err(|_| EngineError::Unavailable)
    }
}

/// The internal engine actor. Runs inside a Tokio task.
struct EngineActor {
    state: GameState,
    router: BroadcastRouter,
    receiver: mpsc::Receiver<EngineCommand>,
}

impl EngineActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(game_id = %self.state.id, "engine started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                EngineCommand::Apply { mv, reply } => {
                    let result = rules::apply_move(&self.state, &mv);
                    match result {
                        Ok(next) => {
                            tracing::info!(
                                game_id = %self.state.id,
                                player = %mv.player,
                                x = mv.x,
                                y = mv.y,
                                value = mv.value,
                                status = %next.status,
                                "move applied"
                            );
                            self.state = next;
                            self.broadcast_state().await;
                            let _ = reply.send(Ok(self.state.clone()));
                        }
                        Err(err) => {
                            tracing::debug!(
                                game_id = %self.state.id,
                                player = %mv.player,
                                x = mv.x,
                                y = mv.y,
                                error = %err,
                                "move rejected"
                            );
                            let _ = reply.send(Err(err));
                        }
                    }
                }
                EngineCommand::Start { reply } => {
                    self.state = rules::start(&self.state);
                    let _ = reply.send(self.state.clone());
                }
                EngineCommand::Snapshot { reply } => {
                    let _ = reply.send(self.state.clone());
                }
                EngineCommand::Stats { reply } => {
                    let _ = reply.send(rules::stats(&self.state));
                }
                EngineCommand::Inject { payload } => {
                    let frame = ServerFrame::GameStateUpdate {
                        data: payload,
                        timestamp: timestamp_ms(),
                    };
                    let delivered = self.router.publish(frame, None).await;
                    tracing::debug!(
                        game_id = %self.state.id,
                        delivered,
                        "injected broadcast"
                    );
                }
                EngineCommand::Shutdown => break,
            }
        }

        tracing::info!(game_id = %self.state.id, "engine stopped");
    }

    /// Publishes the current state to every live connection.
    async fn broadcast_state(&self) {
        match serde_json::to_value(&self.state) {
            Ok(data) => {
                let frame = ServerFrame::GameStateUpdate {
                    data,
                    timestamp: timestamp_ms(),
                };
                let delivered = self.router.publish(frame, None).await;
                tracing::debug!(
                    game_id = %self.state.id,
                    delivered,
                    "state broadcast"
                );
            }
            Err(err) => {
                tracing::error!(
                    game_id = %self.state.id,
                    error = %err,
                    "failed to serialize state for broadcast"
                );
            }
        }
    }
}

/// Spawns the engine actor and returns a handle to it.
pub fn spawn_engine(state: GameState, router: BroadcastRouter) -> EngineHandle {
    let (sender, receiver) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let actor = EngineActor {
        state,
        router,
        receiver,
    };
    tokio::spawn(actor.run());
    EngineHandle { sender }
}
