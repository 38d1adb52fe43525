use serde::{Deserialize, Serialize};

use crate::models::{Direction, Frame, Rect};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "key_down")]
    KeyDown { direction: Direction },
    #[serde(rename = "key_up")]
    KeyUp { direction: Direction },
    #[serde(rename = "restart")]
    Restart,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        width: f32,
        height: f32,
        bricks: Vec<Rect>,
        frame: Frame,
    },
    #[serde(rename = "frame")]
    Frame { frame: Frame },
    #[serde(rename = "game_over")]
    GameOver { score: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_events_are_tagged_by_action() {
        let message: ClientMessage =
            serde_json::from_value(json!({ "action": "key_down", "direction": "left" })).unwrap();
        assert_eq!(
            message,
            ClientMessage::KeyDown {
                direction: Direction::Left
            }
        );

        let message: ClientMessage = serde_json::from_value(json!({ "action": "restart" })).unwrap();
        assert_eq!(message, ClientMessage::Restart);
    }

    #[test]
    fn game_over_shape() {
        assert_eq!(
            serde_json::to_value(ServerMessage::GameOver { score: 120 }).unwrap(),
            json!({ "type": "game_over", "score": 120 })
        );
    }
}
