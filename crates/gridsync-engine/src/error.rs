//! Error types for the game engine.

use gridsync_protocol::PlayerId;

/// Why a move was rejected.
///
/// Every variant is recoverable and leaves the game state untouched;
/// the message text is what the originating client sees in its `error`
/// frame. The variants are checked in a fixed order (bounds, finished,
/// occupancy, turn, membership) so a stale click on an occupied cell
/// reports `CellOccupied` even when it is also out of turn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// Coordinates outside the fixed 10×10 grid.
    #[error("Invalid coordinates: must be between 0 and 9")]
    OutOfBounds,

    /// The target cell already has an occupant. Cells are write-once.
    #[error("Cell is already occupied")]
    CellOccupied,

    /// The move came from a player other than the current one.
    #[error("Not your turn")]
    NotYourTurn,

    /// The player is not part of this game.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// The game is over; moves are rejected, not silently ignored.
    #[error("Game is already finished")]
    GameFinished,
}

/// Errors surfaced by the engine handle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The move was validated and rejected.
    #[error(transparent)]
    Rejected(#[from] MoveError),

    /// The engine actor is gone (shut down or crashed); the command
    /// could not be delivered or answered.
    #[error("game engine is unavailable")]
    Unavailable,
}
