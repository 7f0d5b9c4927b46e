//! The authoritative game core for Gridsync.
//!
//! Three layers, pure to impure:
//!
//! - [`Grid`]/[`Cell`] — value types with invariant-preserving
//!   transitions. Setting a cell returns a *new* grid; nothing is ever
//!   overwritten in place.
//! - [`apply_move`]/[`stats`] — pure game rules over [`GameState`]:
//!   validation in a fixed order, round-robin turn rotation, terminal
//!   detection. A move either yields a fresh state or an error and the
//!   untouched input.
//! - [`EngineHandle`]/[`spawn_engine`] — the engine actor: one Tokio
//!   task exclusively owning the single authoritative `GameState`.
//!   Every validate+apply+broadcast sequence runs to completion inside
//!   the actor loop, so concurrent submissions serialize and the second
//!   of two racing moves always observes the first's effect.
//!
//! # Key types
//!
//! - [`GameState`] — the authoritative state; callers only ever hold
//!   snapshots of it
//! - [`GameMove`] — one transient move request
//! - [`MoveError`] — why a move was rejected (state unchanged)
//! - [`EngineHandle`] — send commands to the running engine actor

mod engine;
mod error;
mod grid;
mod rules;
mod state;

pub use engine::{EngineHandle, spawn_engine};
pub use error::{EngineError, MoveError};
pub use grid::{Cell, GRID_SIZE, Grid};
pub use rules::{apply_move, start, stats};
pub use state::{GameMove, GameState, GameStats, GameStatus, generate_game_id};
