//! The grid model: a fixed 10×10 matrix of write-once cells.
//!
//! All operations here are pure. Mutating transitions return a new
//! `Grid` and leave the original untouched, which is what lets the
//! engine hand out snapshots without synchronization.

use gridsync_protocol::PlayerId;
use serde::{Deserialize, Serialize};

use crate::MoveError;

/// Side length of the grid. Dimensions never change after creation.
pub const GRID_SIZE: usize = 10;

/// One cell of the grid.
///
/// Invariant: `value` is set iff `occupant` is set, and once set both
/// are immutable for the lifetime of the game. The only writer is
/// [`Grid::with_cell_set`], which enforces both halves.
///
/// On the wire the occupant field is called `player`, matching the
/// client-facing snapshot format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "player")]
    pub occupant: Option<PlayerId>,
    pub value: Option<i64>,
}

impl Cell {
    /// Returns `true` if this cell has been claimed.
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// A fixed 10×10 grid, row-major: `rows[y][x]`.
///
/// Serializes as a nested array of cells (`#[serde(transparent)]`), so
/// a snapshot's `grid` field is exactly the matrix clients index into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self {
            rows: vec![vec![Cell::default(); GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Returns `true` if `(x, y)` addresses a cell of this grid.
    pub fn in_bounds(x: i64, y: i64) -> bool {
        (0..GRID_SIZE as i64).contains(&x) && (0..GRID_SIZE as i64).contains(&y)
    }

    /// The cell at `(x, y)`, or `None` when out of bounds.
    pub fn cell(&self, x: i64, y: i64) -> Option<&Cell> {
        if !Self::in_bounds(x, y) {
            return None;
        }
        Some(&self.rows[y as usize][x as usize])
    }

    /// Returns `true` if the cell at `(x, y)` has an occupant.
    /// Out-of-bounds coordinates are not occupied.
    pub fn is_occupied(&self, x: i64, y: i64) -> bool {
        self.cell(x, y).is_some_and(Cell::is_occupied)
    }

    /// Returns a new grid with the cell at `(x, y)` set to
    /// `(occupant, value)`.
    ///
    /// Never overwrites: an occupied target fails with
    /// [`MoveError::CellOccupied`] and the original grid is unchanged.
    ///
    /// # Errors
    /// [`MoveError::OutOfBounds`] or [`MoveError::CellOccupied`].
    pub fn with_cell_set(
        &self,
        x: i64,
        y: i64,
        occupant: PlayerId,
        value: i64,
    ) -> Result<Grid, MoveError> {
        if !Self::in_bounds(x, y) {
            return Err(MoveError::OutOfBounds);
        }
        if self.is_occupied(x, y) {
            return Err(MoveError::CellOccupied);
        }

        let mut next = self.clone();
        next.rows[y as usize][x as usize] = Cell {
            occupant: Some(occupant),
            value: Some(value),
        };
        Ok(next)
    }

    /// Returns `true` iff every cell has an occupant.
    pub fn is_full(&self) -> bool {
        self.cells().all(Cell::is_occupied)
    }

    /// Iterates over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| row.iter())
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
