//! Game state types: the authoritative state, moves, and derived stats.

use std::collections::HashMap;

use gridsync_protocol::{PlayerId, timestamp_ms};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Grid;

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// The lifecycle of a game.
///
/// ```text
/// Waiting ──(first accepted move or explicit start)──→ Active
/// Active ──(grid full)──→ Finished
/// ```
///
/// `Finished` is terminal; no transition leaves it, and moves against a
/// finished game are rejected rather than ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Finished,
}

impl GameStatus {
    /// Returns `true` if no further transition can leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The full state of one game instance.
///
/// Exactly one `GameState` is authoritative per game; the engine actor
/// owns it exclusively and every other holder of a `GameState` has an
/// immutable snapshot. Move application never mutates in place — it
/// produces a fresh value (see [`apply_move`](crate::apply_move)).
///
/// Serializes in camelCase because the whole struct is the
/// `gameStateUpdate` payload clients consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Unique id of this game instance.
    pub id: String,

    /// The 10×10 board.
    pub grid: Grid,

    /// Turn order. Unique, and fixed for the lifetime of the game.
    pub players: Vec<PlayerId>,

    /// Whose turn it is. `None` only when `players` is empty.
    pub current_player: Option<PlayerId>,

    /// Lifecycle status.
    pub status: GameStatus,

    /// Unix milliseconds at creation.
    pub created_at: u64,

    /// Unix milliseconds of the last accepted move.
    pub last_updated: u64,
}

impl GameState {
    /// Creates a fresh game in `Waiting` status with the first player
    /// to move. Duplicate player ids are dropped, keeping first
    /// occurrence order.
    pub fn new(id: impl Into<String>, players: Vec<PlayerId>) -> Self {
        let mut unique: Vec<PlayerId> = Vec::with_capacity(players.len());
        for p in players {
            if !unique.contains(&p) {
                unique.push(p);
            }
        }

        let now = timestamp_ms();
        Self {
            id: id.into(),
            grid: Grid::new(),
            current_player: unique.first().cloned(),
            players: unique,
            status: GameStatus::Waiting,
            created_at: now,
            last_updated: now,
        }
    }
}

/// Generates a random game instance id, e.g. `game-9f2c4a1d8b3e6f07`.
pub fn generate_game_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("game-{hex}")
}

// ---------------------------------------------------------------------------
// GameMove
// ---------------------------------------------------------------------------

/// One move request. Transient: constructed per inbound frame, applied
/// or rejected, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMove {
    pub player: PlayerId,
    pub x: i64,
    pub y: i64,
    pub value: i64,
    /// Unix milliseconds when the server received the move; becomes the
    /// state's `last_updated` on success.
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// GameStats
// ---------------------------------------------------------------------------

/// Derived counters over a state snapshot.
///
/// Computed by one full grid scan per call — O(100) at this fixed size —
/// and never cached, so it can't go stale across moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_cells: usize,
    pub filled_cells: usize,
    pub empty_cells: usize,
    /// Accepted-move count per player. Every game member has an entry,
    /// zero included.
    pub player_moves: HashMap<PlayerId, usize>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: &str) -> PlayerId {
        PlayerId::new(id)
    }

    #[test]
    fn test_new_game_starts_waiting_with_first_player() {
        let state = GameState::new("g1", vec![pid("A"), pid("B")]);

        assert_eq!(state.status, GameStatus::Waiting);
        assert_eq!(state.current_player, Some(pid("A")));
        assert_eq!(state.players, vec![pid("A"), pid("B")]);
        assert!(!state.grid.is_full());
    }

    #[test]
    fn test_new_game_with_no_players_has_no_current_player() {
        let state = GameState::new("g1", vec![]);

        assert!(state.current_player.is_none());
        assert!(state.players.is_empty());
    }

    #[test]
    fn test_new_game_deduplicates_players_preserving_order() {
        let state = GameState::new(
            "g1",
            vec![pid("A"), pid("B"), pid("A"), pid("C"), pid("B")],
        );

        assert_eq!(state.players, vec![pid("A"), pid("B"), pid("C")]);
    }

    #[test]
    fn test_game_status_is_terminal_only_for_finished() {
        assert!(!GameStatus::Waiting.is_terminal());
        assert!(!GameStatus::Active.is_terminal());
        assert!(GameStatus::Finished.is_terminal());
    }

    #[test]
    fn test_game_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&GameStatus::Waiting).unwrap(),
            "\"waiting\""
        );
        assert_eq!(
            serde_json::to_string(&GameStatus::Finished).unwrap(),
            "\"finished\""
        );
    }

    #[test]
    fn test_game_state_serializes_camel_case() {
        let state = GameState::new("g1", vec![pid("A")]);

        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["id"], "g1");
        assert_eq!(json["currentPlayer"], "A");
        assert_eq!(json["status"], "waiting");
        assert!(json["createdAt"].is_u64());
        assert!(json["lastUpdated"].is_u64());
        assert_eq!(json["grid"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_generate_game_id_is_prefixed_and_unique() {
        let a = generate_game_id();
        let b = generate_game_id();

        assert!(a.starts_with("game-"));
        assert_eq!(a.len(), "game-".len() + 16);
        assert_ne!(a, b);
    }
}
