//! WebSocket messages, one module per game.
//!
//! Client messages are tagged with `action`, server messages with `type`.

pub mod breakout;
pub mod minesweeper;
