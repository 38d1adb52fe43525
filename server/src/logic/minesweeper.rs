use std::{
    cmp::{max, min},
    time::Instant,
};

use rand::Rng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use arcade_common::{
    models::{self, Difficulty, GameParams, GameStatus, Pos},
    protocol::minesweeper::{CellUpdate, ServerMessage},
};

use super::{Connections, Session, WsSink};
use crate::data::{Board, Cell, CellState};

/// Keeps at least one cell free so the first click can never hit a mine.
fn validate_params(params: GameParams) -> GameParams {
    let rows = max(params.rows, 1);
    let cols = max(params.cols, 1);
    GameParams {
        rows,
        cols,
        mines: min(params.mines, rows * cols - 1),
    }
}

impl From<&Cell> for models::Cell {
    fn from(value: &Cell) -> Self {
        match value.state {
            CellState::Hidden => Self::Hidden,
            CellState::Flagged => Self::Flagged,
            CellState::Revealed if value.mine => Self::Mine,
            CellState::Revealed => Self::Revealed {
                adjacent: value.adjacent,
            },
        }
    }
}

impl Board {
    /// An empty board; mines are placed on the first reveal.
    pub fn new(params: GameParams) -> Self {
        let params = validate_params(params);
        let cell = Cell {
            mine: false,
            adjacent: 0,
            state: CellState::Hidden,
        };
        Self {
            rows: params.rows,
            cols: params.cols,
            mines: params.mines,
            revealed: 0,
            flagged: 0,
            mines_placed: false,
            status: GameStatus::Playing,
            started_at: None,
            finished_at: None,
            cells: vec![cell; params.rows * params.cols],
        }
    }

    /// A board with a fixed mine layout. Out-of-range and duplicate positions
    /// are skipped, as is anything past `rows * cols - 1` mines.
    pub fn with_mines(rows: usize, cols: usize, mines: &[Pos]) -> Self {
        let mut board = Self::new(GameParams {
            rows,
            cols,
            mines: 0,
        });
        let limit = board.rows * board.cols - 1;

        for &pos in mines {
            if board.mines == limit {
                break;
            }
            if let Some(index) = board.index(pos)
                && !board.cells[index].mine
            {
                board.cells[index].mine = true;
                board.mines += 1;
            }
        }

        board.mines_placed = true;
        board.count_adjacent_mines();
        board
    }

    pub fn validate_pos(&self, pos: &Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.validate_pos(&pos)
            .then(|| pos.row * self.cols + pos.col)
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).map(|index| &self.cells[index])
    }

    fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + use<> {
        let (rows, cols) = (self.rows, self.cols);
        (-1isize..=1)
            .flat_map(|dr| (-1isize..=1).map(move |dc| (dr, dc)))
            .filter(|&offset| offset != (0, 0))
            .filter_map(move |(dr, dc)| {
                let row = pos.row.checked_add_signed(dr)?;
                let col = pos.col.checked_add_signed(dc)?;
                (row < rows && col < cols).then_some(Pos { row, col })
            })
    }

    /// Rejection-samples mine positions, never using `exclude`.
    pub fn place_mines<R: Rng + ?Sized>(&mut self, exclude: Pos, rng: &mut R) {
        if self.mines_placed {
            debug!("Mines already placed, ignoring placement request");
            return;
        }

        let mut mines_left = self.mines;
        while mines_left > 0 {
            let pos = Pos {
                row: rng.random_range(0..self.rows),
                col: rng.random_range(0..self.cols),
            };
            let index = pos.row * self.cols + pos.col;

            if pos == exclude || self.cells[index].mine {
                continue;
            }

            self.cells[index].mine = true;
            mines_left -= 1;
        }

        self.mines_placed = true;
        self.count_adjacent_mines();
        debug!(
            "Placed {} mines avoiding ({}, {})",
            self.mines, exclude.row, exclude.col
        );
    }

    fn count_adjacent_mines(&mut self) {
        for index in 0..self.cells.len() {
            if self.cells[index].mine {
                continue;
            }

            let pos = Pos {
                row: index / self.cols,
                col: index % self.cols,
            };
            let count = self
                .neighbors(pos)
                .filter(|&n| self.cells[n.row * self.cols + n.col].mine)
                .count();
            self.cells[index].adjacent = count as u8;
        }
    }

    pub fn remaining_mines(&self) -> i64 {
        self.mines as i64 - self.flagged as i64
    }

    pub fn has_won(&self) -> bool {
        self.rows * self.cols == self.mines + self.revealed
    }

    pub fn elapsed_secs(&self) -> u64 {
        match self.started_at {
            None => 0,
            Some(started) => self
                .finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(started)
                .as_secs(),
        }
    }

    pub fn field(&self) -> Vec<Vec<models::Cell>> {
        self.cells
            .iter()
            .map(|cell| cell.into())
            .collect::<Vec<models::Cell>>()
            .chunks(self.cols)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    fn finish(&mut self, status: GameStatus) {
        self.status = status;
        self.finished_at = Some(Instant::now());
    }

    /// Reveals `pos`, placing mines first if this is the opening move.
    /// Every cell that changes is pushed onto `updates`; an ignored move
    /// leaves it empty.
    pub fn reveal<R: Rng + ?Sized>(
        &mut self,
        pos: Pos,
        rng: &mut R,
        updates: &mut Vec<CellUpdate>,
    ) {
        if self.status.is_finished() {
            debug!(
                "Ignoring reveal on finished game at ({}, {})",
                pos.row, pos.col
            );
            return;
        }

        let Some(index) = self.index(pos) else {
            warn!("Invalid reveal position: ({}, {})", pos.row, pos.col);
            return;
        };

        if self.cells[index].state != CellState::Hidden {
            debug!(
                "Ignoring reveal on {:?} cell ({}, {})",
                self.cells[index].state, pos.row, pos.col
            );
            return;
        }

        if !self.mines_placed {
            self.place_mines(pos, rng);
        }
        self.started_at.get_or_insert_with(Instant::now);

        if self.cells[index].mine {
            warn!("Mine hit at ({}, {}) - game over!", pos.row, pos.col);
            self.reveal_mines(updates);
            self.finish(GameStatus::Lost);
            return;
        }

        self.flood_reveal(pos, updates);
        if self.has_won() {
            info!("All safe cells revealed, game won");
            self.finish(GameStatus::Won);
        }
    }

    fn flood_reveal(&mut self, start: Pos, updates: &mut Vec<CellUpdate>) {
        let mut pending = vec![start];

        while let Some(pos) = pending.pop() {
            let Some(index) = self.index(pos) else {
                continue;
            };
            let cell = &mut self.cells[index];
            if cell.state != CellState::Hidden || cell.mine {
                continue;
            }

            cell.state = CellState::Revealed;
            self.revealed += 1;
            updates.push(CellUpdate {
                pos,
                value: (&*cell).into(),
            });

            if cell.adjacent == 0 {
                pending.extend(self.neighbors(pos));
            }
        }
    }

    fn reveal_mines(&mut self, updates: &mut Vec<CellUpdate>) {
        for index in 0..self.cells.len() {
            let cell = &mut self.cells[index];
            if !cell.mine {
                continue;
            }

            // `flagged` is left alone; the mine counter freezes at the loss.
            cell.state = CellState::Revealed;
            updates.push(CellUpdate {
                pos: Pos {
                    row: index / self.cols,
                    col: index % self.cols,
                },
                value: (&*cell).into(),
            });
        }
    }

    /// Flips a hidden cell to flagged and back. Revealed cells, finished
    /// games and out-of-range positions yield `None`.
    pub fn toggle_flag(&mut self, pos: Pos) -> Option<CellUpdate> {
        if self.status.is_finished() {
            debug!(
                "Ignoring flag on finished game at ({}, {})",
                pos.row, pos.col
            );
            return None;
        }

        let Some(index) = self.index(pos) else {
            warn!("Invalid flag position: ({}, {})", pos.row, pos.col);
            return None;
        };

        let cell = &mut self.cells[index];
        match cell.state {
            CellState::Hidden => {
                cell.state = CellState::Flagged;
                self.flagged += 1;
                debug!("Cell ({}, {}) flagged", pos.row, pos.col);
            }
            CellState::Flagged => {
                cell.state = CellState::Hidden;
                self.flagged -= 1;
                debug!("Cell ({}, {}) unflagged", pos.row, pos.col);
            }
            CellState::Revealed => {
                debug!("Ignoring flag on revealed cell ({}, {})", pos.row, pos.col);
                return None;
            }
        }

        Some(CellUpdate {
            pos,
            value: (&*cell).into(),
        })
    }
}

/// One minesweeper board shared by every connected stream.
pub struct MinesweeperGame {
    board: Board,
    difficulty: Difficulty,
    connections: Connections,
}

impl Session for MinesweeperGame {
    fn connections(&self) -> &Connections {
        &self.connections
    }
}

impl MinesweeperGame {
    #[instrument(level = "trace")]
    pub fn new(difficulty: Difficulty) -> Self {
        let params = difficulty.params();
        info!(
            "Creating new minesweeper game ({:?}): {}x{} with {} mines",
            difficulty, params.rows, params.cols, params.mines
        );
        Self {
            board: Board::new(params),
            difficulty,
            connections: Connections::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn init_message(&self) -> ServerMessage {
        ServerMessage::Init {
            rows: self.board.rows,
            cols: self.board.cols,
            mines: self.board.mines,
            field: self.board.field(),
        }
    }

    fn update_message(&self, updates: Vec<CellUpdate>) -> ServerMessage {
        ServerMessage::Update {
            updates,
            remaining_mines: self.board.remaining_mines(),
            status: self.board.status,
            elapsed_secs: self.board.elapsed_secs(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn restart(&mut self, difficulty: Difficulty) {
        info!("Restarting minesweeper game with difficulty {:?}", difficulty);
        self.difficulty = difficulty;
        self.board = Board::new(difficulty.params());
        self.connections.touch();
        let message = self.init_message();
        self.connections.broadcast(&message).await;
        info!(
            "Game restarted and broadcasted to {} connections",
            self.connections.len()
        );
    }

    #[instrument(level = "trace", skip(self, stream))]
    pub async fn add_stream(&mut self, stream: WsSink) -> Uuid {
        let init = self.init_message();
        self.connections.add(stream, &init).await
    }

    #[instrument(level = "trace", skip(self))]
    pub fn remove_stream(&mut self, id: &Uuid) {
        self.connections.remove(id);
    }

    /// Applies a reveal and returns the changed cells, which are also
    /// broadcast to every stream.
    #[instrument(level = "trace", skip(self), fields(row = pos.row, col = pos.col))]
    pub async fn reveal(&mut self, pos: Pos) -> Vec<CellUpdate> {
        self.connections.touch();

        let mut updates = Vec::new();
        self.board.reveal(pos, &mut rand::rng(), &mut updates);
        if updates.is_empty() {
            return updates;
        }

        match self.board.status.message() {
            Some(banner) => info!("{} ({} cells changed)", banner, updates.len()),
            None => debug!("Revealed {} cells, game continues", updates.len()),
        }

        let message = self.update_message(updates.clone());
        self.connections.broadcast(&message).await;
        updates
    }

    #[instrument(level = "trace", skip(self), fields(row = pos.row, col = pos.col))]
    pub async fn flag(&mut self, pos: Pos) -> Option<CellUpdate> {
        self.connections.touch();

        let update = self.board.toggle_flag(pos)?;
        let message = self.update_message(vec![update]);
        self.connections.broadcast(&message).await;
        Some(update)
    }
}
