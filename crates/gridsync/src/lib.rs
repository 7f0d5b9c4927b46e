//! # Gridsync
//!
//! Realtime grid game synchronization server over WebSockets.
//!
//! A Gridsync server hosts one authoritative 10×10 grid game. Clients
//! connect over WebSocket, submit moves as JSON frames, and every
//! accepted move is broadcast back to all connected clients as a full
//! state snapshot. Validation, turn order, and game lifecycle are
//! enforced server-side; clients only ever render what the server says.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridsync::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GridsyncError> {
//!     let server = GridServer::builder()
//!         .bind("0.0.0.0:8080")
//!         .players(["A", "B"])
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::GridsyncError;
pub use server::{GridServer, GridServerBuilder, ServerConfig, ServerHandle};

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::{
        GridServer, GridServerBuilder, GridsyncError, ServerConfig,
        ServerHandle,
    };
    pub use gridsync_engine::{
        Cell, EngineError, GRID_SIZE, GameMove, GameState, GameStats,
        GameStatus, Grid, MoveError,
    };
    pub use gridsync_protocol::{ClientFrame, PlayerId, ServerFrame};
}
