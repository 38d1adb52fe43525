use std::collections::HashMap;

use arcade_common::{
    models::{Cell, Difficulty, GameStatus, Pos},
    protocol::minesweeper::{CellUpdate, ClientMessage, ServerMessage},
};
use tracing::{debug, info};

use crate::{
    Result,
    client::GameKind,
    handle::{GameHandle, Mirror},
};

/// Events emitted by a minesweeper game
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Cells changed state
    BoardUpdated { changed_positions: Vec<Pos> },
    /// The game was won or lost
    GameStatusChanged { status: GameStatus },
    /// Game was initialized or restarted
    GameInitialized {
        rows: usize,
        cols: usize,
        mines: usize,
    },
    /// Connection was lost
    ConnectionLost,
}

/// The board as this client last heard it from the server
#[derive(Debug, Clone)]
pub struct BoardState {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
    pub board: Vec<Vec<Cell>>,
    pub status: GameStatus,
    pub remaining_mines: i64,
    pub elapsed_secs: u64,
}

impl BoardState {
    pub fn new(rows: usize, cols: usize, mines: usize, board: Vec<Vec<Cell>>) -> Self {
        Self {
            rows,
            cols,
            mines,
            board,
            status: GameStatus::Playing,
            remaining_mines: mines as i64,
            elapsed_secs: 0,
        }
    }

    pub fn get_cell(&self, pos: Pos) -> Option<&Cell> {
        self.board.get(pos.row)?.get(pos.col)
    }

    pub fn set_cell(&mut self, pos: Pos, cell: Cell) {
        if let Some(slot) = self
            .board
            .get_mut(pos.row)
            .and_then(|row| row.get_mut(pos.col))
        {
            *slot = cell;
        }
    }

    /// Count the number of cells in each state
    pub fn count_cells(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for cell in self.board.iter().flatten() {
            let state = match cell {
                Cell::Hidden => "hidden",
                Cell::Flagged => "flagged",
                Cell::Revealed { .. } => "revealed",
                Cell::Mine => "mine",
            };
            *counts.entry(state).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_finished()
    }

    pub fn is_won(&self) -> bool {
        self.status == GameStatus::Won
    }

    fn apply_update(
        &mut self,
        updates: Vec<CellUpdate>,
        remaining_mines: i64,
        status: GameStatus,
        elapsed_secs: u64,
    ) -> Vec<GameEvent> {
        let changed_positions: Vec<Pos> = updates.iter().map(|u| u.pos).collect();
        for update in updates {
            self.set_cell(update.pos, update.value);
        }
        self.remaining_mines = remaining_mines;
        self.elapsed_secs = elapsed_secs;

        let mut events = Vec::new();
        if !changed_positions.is_empty() {
            events.push(GameEvent::BoardUpdated { changed_positions });
        }
        if self.status != status {
            self.status = status;
            events.push(GameEvent::GameStatusChanged { status });
        }
        events
    }
}

impl Mirror for BoardState {
    type Outgoing = ClientMessage;
    type Incoming = ServerMessage;
    type Event = GameEvent;

    const KIND: GameKind = GameKind::Minesweeper;

    fn apply(state: &mut Option<Self>, message: ServerMessage) -> Vec<GameEvent> {
        match message {
            ServerMessage::Init {
                rows,
                cols,
                mines,
                field,
            } => {
                info!(
                    "Received game initialization: {}x{} with {} mines",
                    rows, cols, mines
                );
                *state = Some(BoardState::new(rows, cols, mines, field));
                vec![GameEvent::GameInitialized { rows, cols, mines }]
            }
            ServerMessage::Update {
                updates,
                remaining_mines,
                status,
                elapsed_secs,
            } => {
                debug!(
                    "Received update: {} cells updated, status: {:?}",
                    updates.len(),
                    status
                );
                match state.as_mut() {
                    Some(board) => board.apply_update(updates, remaining_mines, status, elapsed_secs),
                    None => Vec::new(),
                }
            }
        }
    }

    fn connection_lost() -> GameEvent {
        GameEvent::ConnectionLost
    }
}

/// High-level minesweeper client that mirrors the board locally
pub type MinesweeperGame = GameHandle<BoardState>;

impl GameHandle<BoardState> {
    /// Create a game on the server and join it
    pub async fn start_game(&self, difficulty: Difficulty) -> Result<()> {
        info!("Starting new minesweeper game: {:?}", difficulty);

        let game_id = self.client().create_minesweeper(difficulty).await?;
        info!("Created game with ID: {}", game_id);

        self.join_game(game_id).await
    }

    /// Reveal a cell at the specified position
    pub async fn reveal(&self, pos: Pos) -> Result<()> {
        debug!("Revealing cell at ({}, {})", pos.row, pos.col);
        self.send_client_message(ClientMessage::Reveal { pos }).await
    }

    /// Flag/unflag a cell at the specified position
    pub async fn flag(&self, pos: Pos) -> Result<()> {
        debug!("Flagging cell at ({}, {})", pos.row, pos.col);
        self.send_client_message(ClientMessage::Flag { pos }).await
    }

    /// Restart the game at a new difficulty
    pub async fn restart(&self, difficulty: Difficulty) -> Result<()> {
        info!("Restarting game with difficulty {:?}", difficulty);
        self.send_client_message(ClientMessage::Restart { difficulty })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(rows: usize, cols: usize, mines: usize) -> ServerMessage {
        ServerMessage::Init {
            rows,
            cols,
            mines,
            field: vec![vec![Cell::Hidden; cols]; rows],
        }
    }

    #[test]
    fn init_replaces_the_board() {
        let mut state = None;
        let events = BoardState::apply(&mut state, init(3, 4, 2));

        assert_eq!(
            events,
            vec![GameEvent::GameInitialized {
                rows: 3,
                cols: 4,
                mines: 2
            }]
        );
        let board = state.unwrap();
        assert_eq!(board.count_cells().get("hidden"), Some(&12));
        assert_eq!(board.remaining_mines, 2);
        assert!(!board.is_game_over());
    }

    #[test]
    fn updates_before_init_are_dropped() {
        let mut state: Option<BoardState> = None;
        let events = BoardState::apply(
            &mut state,
            ServerMessage::Update {
                updates: vec![],
                remaining_mines: 0,
                status: GameStatus::Won,
                elapsed_secs: 0,
            },
        );
        assert!(events.is_empty());
        assert!(state.is_none());
    }

    #[test]
    fn updates_patch_cells_and_report_status_changes() {
        let mut state = None;
        BoardState::apply(&mut state, init(2, 2, 1));

        let events = BoardState::apply(
            &mut state,
            ServerMessage::Update {
                updates: vec![CellUpdate {
                    pos: Pos::new(1, 0),
                    value: Cell::Flagged,
                }],
                remaining_mines: 0,
                status: GameStatus::Playing,
                elapsed_secs: 3,
            },
        );
        assert_eq!(
            events,
            vec![GameEvent::BoardUpdated {
                changed_positions: vec![Pos::new(1, 0)]
            }]
        );

        let events = BoardState::apply(
            &mut state,
            ServerMessage::Update {
                updates: vec![CellUpdate {
                    pos: Pos::new(0, 0),
                    value: Cell::Mine,
                }],
                remaining_mines: 0,
                status: GameStatus::Lost,
                elapsed_secs: 5,
            },
        );
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            GameEvent::GameStatusChanged {
                status: GameStatus::Lost
            }
        );

        let board = state.unwrap();
        assert_eq!(board.get_cell(Pos::new(0, 0)), Some(&Cell::Mine));
        assert_eq!(board.get_cell(Pos::new(1, 0)), Some(&Cell::Flagged));
        assert_eq!(board.remaining_mines, 0);
        assert_eq!(board.elapsed_secs, 5);
        assert!(board.is_game_over());
        assert!(!board.is_won());
        assert_eq!(board.status.message(), Some("Game Over!"));
    }

    #[test]
    fn out_of_range_updates_are_ignored() {
        let mut board = BoardState::new(1, 1, 0, vec![vec![Cell::Hidden]]);
        board.set_cell(Pos::new(3, 3), Cell::Mine);
        assert_eq!(board.get_cell(Pos::new(3, 3)), None);
        assert_eq!(board.count_cells().get("mine"), None);
    }

    #[test]
    fn actions_need_a_connection() {
        let game = MinesweeperGame::new("http://localhost:8000").unwrap();
        tokio_test::block_on(async {
            assert!(!game.is_connected().await);
            assert!(game.reveal(Pos::new(0, 0)).await.is_err());
            assert!(game.flag(Pos::new(0, 0)).await.is_err());
            assert!(game.get_state().await.is_none());
            assert!(game.get_game_id().await.is_none());
        });
    }
}
