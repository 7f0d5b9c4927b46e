//! Pure game rules: move validation, turn rotation, lifecycle, stats.
//!
//! Everything here is a function from state to state. No clocks, no
//! channels, no I/O; the engine actor supplies those.

use std::collections::HashMap;

use crate::{GameMove, GameState, GameStats, GameStatus, Grid, MoveError};

/// Validates `mv` against `state` and, if accepted, returns the
/// successor state. `state` itself is never modified.
///
/// Validation runs in a fixed order and stops at the first failure:
///
/// 1. coordinates in bounds
/// 2. game not finished
/// 3. target cell unoccupied
/// 4. it is `mv.player`'s turn
/// 5. `mv.player` is a member of the game
///
/// On success the cell is claimed, the turn advances round-robin, the
/// game activates if it was waiting, finishes if the grid is now full,
/// and `last_updated` takes the move's timestamp.
pub fn apply_move(state: &GameState, mv: &GameMove) -> Result<GameState, MoveError> {
    if !Grid::in_bounds(mv.x, mv.y) {
        return Err(MoveError::OutOfBounds);
    }
    if state.status.is_terminal() {
        return Err(MoveError::GameFinished);
    }
    if state.grid.is_occupied(mv.x, mv.y) {
        return Err(MoveError::CellOccupied);
    }
    if state.current_player.as_ref() != Some(&mv.player) {
        return Err(MoveError::NotYourTurn);
    }
    let position = state
        .players
        .iter()
        .position(|p| *p == mv.player)
        .ok_or_else(|| MoveError::UnknownPlayer(mv.player.clone()))?;

    let grid = state.grid.with_cell_set(mv.x, mv.y, mv.player.clone(), mv.value)?;

    let next_player = state.players[(position + 1) % state.players.len()].clone();
    let status = if grid.is_full() {
        GameStatus::Finished
    } else {
        GameStatus::Active
    };

    Ok(GameState {
        id: state.id.clone(),
        grid,
        players: state.players.clone(),
        current_player: Some(next_player),
        status,
        created_at: state.created_at,
        last_updated: mv.timestamp,
    })
}

/// Transitions a waiting game to active. Already-active games are left
/// alone; finished games stay finished.
pub fn start(state: &GameState) -> GameState {
    match state.status {
        GameStatus::Waiting => GameState {
            status: GameStatus::Active,
            ..state.clone()
        },
        GameStatus::Active | GameStatus::Finished => state.clone(),
    }
}

/// Computes cell and per-player move counts from a snapshot.
///
/// Every member of `state.players` gets an entry, including those with
/// zero accepted moves. Occupants not in the player list (possible only
/// in hand-built states) are counted too.
pub fn stats(state: &GameState) -> GameStats {
    let mut player_moves: HashMap<_, _> = state
        .players
        .iter()
        .map(|p| (p.clone(), 0usize))
        .collect();

    let mut filled_cells = 0;
    for cell in state.grid.cells() {
        if let Some(occupant) = &cell.occupant {
            filled_cells += 1;
            *player_moves.entry(occupant.clone()).or_insert(0) += 1;
        }
    }

    let total_cells = crate::GRID_SIZE * crate::GRID_SIZE;
    GameStats {
        total_cells,
        filled_cells,
        empty_cells: total_cells - filled_cells,
        player_moves,
    }
}

// =========================================================================
// Tests
// =========================================================================
