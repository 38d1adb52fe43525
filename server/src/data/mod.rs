mod breakout;
mod minesweeper;

pub use breakout::{Ball, Breakout, BreakoutConfig, Brick, Paddle};
pub use minesweeper::{Board, Cell, CellState};
