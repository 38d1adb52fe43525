use serde::{Deserialize, Serialize};

use crate::models::{Cell, Difficulty, GameStatus, Pos};

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "reveal")]
    Reveal { pos: Pos },
    #[serde(rename = "flag")]
    Flag { pos: Pos },
    #[serde(rename = "restart")]
    Restart {
        #[serde(default)]
        difficulty: Difficulty,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellUpdate {
    pub pos: Pos,
    pub value: Cell,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        rows: usize,
        cols: usize,
        mines: usize,
        field: Vec<Vec<Cell>>,
    },
    #[serde(rename = "update")]
    Update {
        updates: Vec<CellUpdate>,
        remaining_mines: i64,
        status: GameStatus,
        elapsed_secs: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reveal_is_tagged_by_action() {
        let message: ClientMessage =
            serde_json::from_value(json!({ "action": "reveal", "pos": { "row": 2, "col": 5 } }))
                .unwrap();
        match message {
            ClientMessage::Reveal { pos } => assert_eq!(pos, Pos::new(2, 5)),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn restart_without_difficulty_is_easy() {
        let message: ClientMessage = serde_json::from_value(json!({ "action": "restart" })).unwrap();
        assert!(matches!(
            message,
            ClientMessage::Restart {
                difficulty: Difficulty::Easy
            }
        ));
    }

    #[test]
    fn update_shape() {
        let message = ServerMessage::Update {
            updates: vec![CellUpdate {
                pos: Pos::new(0, 1),
                value: Cell::Mine,
            }],
            remaining_mines: -1,
            status: GameStatus::Lost,
            elapsed_secs: 4,
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "update",
                "updates": [{ "pos": { "row": 0, "col": 1 }, "value": { "state": "mine" } }],
                "remaining_mines": -1,
                "status": "lost",
                "elapsed_secs": 4
            })
        );
    }
}
