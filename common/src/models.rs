use serde::{Deserialize, Serialize};

/// What a player can see of a single minesweeper cell.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "state")]
pub enum Cell {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "flagged")]
    Flagged,
    #[serde(rename = "revealed")]
    Revealed { adjacent: u8 },
    #[serde(rename = "mine")]
    Mine,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn params(self) -> GameParams {
        match self {
            Difficulty::Easy => GameParams {
                rows: 8,
                cols: 8,
                mines: 10,
            },
            Difficulty::Medium => GameParams {
                rows: 16,
                cols: 16,
                mines: 40,
            },
            Difficulty::Hard => GameParams {
                rows: 24,
                cols: 24,
                mines: 99,
            },
        }
    }
}

/// Board dimensions and mine count.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct GameParams {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
}

impl From<Difficulty> for GameParams {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.params()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NewMinesweeper {
    pub difficulty: Difficulty,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        self != GameStatus::Playing
    }

    /// Terminal banner text, if the game has ended.
    pub fn message(self) -> Option<&'static str> {
        match self {
            GameStatus::Playing => None,
            GameStatus::Won => Some("You Win!"),
            GameStatus::Lost => Some("Game Over!"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BallView {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Everything a breakout renderer needs to draw one frame.
///
/// `bricks` holds the visibility of each brick in the order they were sent
/// in the `init` message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Frame {
    pub paddle: Rect,
    pub ball: BallView,
    pub bricks: Vec<bool>,
    pub score: u32,
    pub lives: u32,
    pub game_over: bool,
}

#[derive(Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn difficulty_presets() {
        assert_eq!(
            Difficulty::Easy.params(),
            GameParams {
                rows: 8,
                cols: 8,
                mines: 10
            }
        );
        assert_eq!(Difficulty::Medium.params().mines, 40);
        let hard = GameParams::from(Difficulty::Hard);
        assert_eq!((hard.rows, hard.cols, hard.mines), (24, 24, 99));
    }

    #[test]
    fn status_banners() {
        assert_eq!(GameStatus::Playing.message(), None);
        assert_eq!(GameStatus::Won.message(), Some("You Win!"));
        assert_eq!(GameStatus::Lost.message(), Some("Game Over!"));
        assert!(!GameStatus::Playing.is_finished());
        assert!(GameStatus::Lost.is_finished());
    }

    #[test]
    fn cell_wire_format() {
        assert_eq!(
            serde_json::to_value(Cell::Revealed { adjacent: 3 }).unwrap(),
            json!({ "state": "revealed", "adjacent": 3 })
        );
        assert_eq!(
            serde_json::to_value(Cell::Flagged).unwrap(),
            json!({ "state": "flagged" })
        );
    }

    #[test]
    fn new_game_defaults_to_easy() {
        let request: NewMinesweeper = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.difficulty, Difficulty::Easy);

        let request: NewMinesweeper =
            serde_json::from_value(json!({ "difficulty": "hard" })).unwrap();
        assert_eq!(request.difficulty, Difficulty::Hard);
    }
}
