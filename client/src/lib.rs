//! Arcade Client Library
//!
//! A Rust client for the arcade server. It creates games over HTTP and plays
//! them over WebSocket connections, keeping a local mirror of each game.
//!
//! ## Usage
//!
//! ### High-Level Interface (Recommended)
//!
//! `MinesweeperGame` and `BreakoutGame` manage the game state locally and
//! provide convenient methods for game actions:
//!
//! ```rust,no_run
//! use arcade_client::{Difficulty, MinesweeperGame, Pos};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let game = MinesweeperGame::new("http://localhost:8000")?;
//!
//!     game.start_game(Difficulty::Easy).await?;
//!
//!     game.reveal(Pos::new(0, 0)).await?;
//!     game.flag(Pos::new(1, 1)).await?;
//!
//!     if let Some(state) = game.get_state().await {
//!         println!("Game over: {}, Won: {}", state.is_game_over(), state.is_won());
//!     }
//!
//!     game.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Low-Level Interface
//!
//! For more control, use `ArcadeClient` and a typed `GameSocket` directly:
//!
//! ```rust,no_run
//! use arcade_client::{ArcadeClient, BreakoutSocket, Direction, GameKind};
//! use arcade_client::protocol::breakout::ClientMessage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = ArcadeClient::new("http://localhost:8000")?;
//!     let game_id = client.create_breakout().await?;
//!
//!     let ws_url = client.websocket_url(GameKind::Breakout, &game_id)?;
//!     let mut ws = BreakoutSocket::connect(&ws_url).await?;
//!
//!     if let Some(message) = ws.receive_message().await? {
//!         println!("Received: {:?}", message);
//!     }
//!
//!     ws.send_message(ClientMessage::KeyDown { direction: Direction::Left })?;
//!
//!     ws.close().await?;
//!     Ok(())
//! }
//! ```

mod breakout;
mod client;
mod handle;
mod minesweeper;
mod websocket;

pub use breakout::{BreakoutEvent, BreakoutGame, BreakoutState};
pub use client::{ArcadeClient, GameKind};
pub use handle::{GameHandle, Mirror};
pub use minesweeper::{BoardState, GameEvent, MinesweeperGame};
pub use websocket::{BreakoutSocket, GameSocket, MinesweeperSocket};

// Re-export common types for convenience
pub use arcade_common::{models::*, protocol};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
