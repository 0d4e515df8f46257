use serde::Serialize;

use crate::config::game::BOARD_SIZE;
use crate::game::error::BoardError;
use crate::game::types::{CellState, Coordinate};

const SIZE: usize = BOARD_SIZE as usize;

/// Per-player hidden board.
///
/// Boards are values: every mutation returns a new board and leaves the original intact.
/// Cells only move forward (EMPTY→SHIP during placement, SHIP→HIT/FATAL or EMPTY→MISS
/// during play) and a shot cell is never touched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Board {
    cells: [[CellState; SIZE]; SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[CellState::Empty; SIZE]; SIZE],
        }
    }

    pub fn cell(&self, coordinate: Coordinate) -> CellState {
        self.cells[coordinate.y as usize][coordinate.x as usize]
    }

    pub fn is_cell_shot(&self, coordinate: Coordinate) -> bool {
        self.cell(coordinate).is_shot()
    }

    /// Return a board with the given cells marked as SHIP.
    /// Placement must have been validated beforehand; hitting an occupied or shot cell is a bug.
    pub fn place_ship<I>(&self, coordinates: I) -> Result<Board, BoardError>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut next = *self;
        for coordinate in coordinates {
            if next.cell(coordinate) != CellState::Empty {
                return Err(BoardError::Occupied(coordinate));
            }
            next.set(coordinate, CellState::Ship);
        }
        Ok(next)
    }

    /// Return a board with a shot applied: FATAL if `is_fatal`, else HIT if `is_hit`, else MISS.
    pub fn shoot(&self, coordinate: Coordinate, is_hit: bool, is_fatal: bool) -> Result<Board, BoardError> {
        if self.is_cell_shot(coordinate) {
            return Err(BoardError::AlreadyShot(coordinate));
        }
        let state = if is_fatal {
            CellState::Fatal
        } else if is_hit {
            CellState::Hit
        } else {
            CellState::Miss
        };
        let mut next = *self;
        next.set(coordinate, state);
        Ok(next)
    }

    /// All cells still holding an untouched ship part.
    pub fn ship_coordinates(&self) -> Vec<Coordinate> {
        self.iter()
            .filter(|(_, state)| *state == CellState::Ship)
            .map(|(coordinate, _)| coordinate)
            .collect()
    }

    pub fn has_ships_remaining(&self) -> bool {
        self.iter().any(|(_, state)| state == CellState::Ship)
    }

    #[cfg(test)]
    pub fn count(&self, state: CellState) -> usize {
        self.iter().filter(|(_, s)| *s == state).count()
    }

    /// Iterate over every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, CellState)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, state)| {
                (Coordinate { x: x as u8, y: y as u8 }, *state)
            })
        })
    }

    fn set(&mut self, coordinate: Coordinate, state: CellState) {
        self.cells[coordinate.y as usize][coordinate.x as usize] = state;
    }
}
