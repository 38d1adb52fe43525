use std::time::Instant;

use arcade_common::models::GameStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub mine: bool,
    pub adjacent: u8,
    pub state: CellState,
}

/// A minesweeper board stored row-major; a cell's position is its index.
#[derive(Debug)]
pub struct Board {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
    pub revealed: usize,
    pub flagged: usize,
    pub mines_placed: bool,
    pub status: GameStatus,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub cells: Vec<Cell>,
}
