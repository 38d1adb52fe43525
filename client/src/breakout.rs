use arcade_common::{
    models::{Direction, Frame, Rect},
    protocol::breakout::{ClientMessage, ServerMessage},
};
use tracing::{debug, info};

use crate::{
    Result,
    client::GameKind,
    handle::{GameHandle, Mirror},
};

/// Events emitted by a breakout game
#[derive(Debug, Clone, PartialEq)]
pub enum BreakoutEvent {
    /// Game was initialized or restarted
    Initialized { width: f32, height: f32, bricks: usize },
    /// A new frame arrived
    FrameUpdated { score: u32, lives: u32 },
    /// The last life was lost
    GameOver { score: u32 },
    /// Connection was lost
    ConnectionLost,
}

/// The latest frame plus the static brick layout
#[derive(Debug, Clone)]
pub struct BreakoutState {
    pub width: f32,
    pub height: f32,
    pub bricks: Vec<Rect>,
    pub frame: Frame,
    pub final_score: Option<u32>,
}

impl BreakoutState {
    /// Bricks still standing in the latest frame
    pub fn visible_bricks(&self) -> impl Iterator<Item = &Rect> {
        self.bricks
            .iter()
            .zip(&self.frame.bricks)
            .filter(|(_, visible)| **visible)
            .map(|(brick, _)| brick)
    }

    pub fn is_game_over(&self) -> bool {
        self.frame.game_over
    }
}

impl Mirror for BreakoutState {
    type Outgoing = ClientMessage;
    type Incoming = ServerMessage;
    type Event = BreakoutEvent;

    const KIND: GameKind = GameKind::Breakout;

    fn apply(state: &mut Option<Self>, message: ServerMessage) -> Vec<BreakoutEvent> {
        match message {
            ServerMessage::Init {
                width,
                height,
                bricks,
                frame,
            } => {
                info!(
                    "Received breakout initialization: {}x{} with {} bricks",
                    width,
                    height,
                    bricks.len()
                );
                let count = bricks.len();
                *state = Some(BreakoutState {
                    width,
                    height,
                    bricks,
                    frame,
                    final_score: None,
                });
                vec![BreakoutEvent::Initialized {
                    width,
                    height,
                    bricks: count,
                }]
            }
            ServerMessage::Frame { frame } => match state.as_mut() {
                Some(game) => {
                    let event = BreakoutEvent::FrameUpdated {
                        score: frame.score,
                        lives: frame.lives,
                    };
                    game.frame = frame;
                    vec![event]
                }
                None => Vec::new(),
            },
            ServerMessage::GameOver { score } => {
                debug!("Received game over with score {}", score);
                if let Some(game) = state.as_mut() {
                    game.final_score = Some(score);
                }
                vec![BreakoutEvent::GameOver { score }]
            }
        }
    }

    fn connection_lost() -> BreakoutEvent {
        BreakoutEvent::ConnectionLost
    }
}

/// High-level breakout client that mirrors the latest frame locally
pub type BreakoutGame = GameHandle<BreakoutState>;

impl GameHandle<BreakoutState> {
    /// Create a game on the server and join it
    pub async fn start_game(&self) -> Result<()> {
        info!("Starting new breakout game");

        let game_id = self.client().create_breakout().await?;
        info!("Created game with ID: {}", game_id);

        self.join_game(game_id).await
    }

    pub async fn key_down(&self, direction: Direction) -> Result<()> {
        self.send_client_message(ClientMessage::KeyDown { direction })
            .await
    }

    pub async fn key_up(&self, direction: Direction) -> Result<()> {
        self.send_client_message(ClientMessage::KeyUp { direction })
            .await
    }

    pub async fn restart(&self) -> Result<()> {
        info!("Restarting breakout game");
        self.send_client_message(ClientMessage::Restart).await
    }
}

#[cfg(test)]
mod tests {
    use arcade_common::models::BallView;

    use super::*;

    fn frame(bricks: Vec<bool>, score: u32, lives: u32, game_over: bool) -> Frame {
        Frame {
            paddle: Rect {
                x: 350.0,
                y: 570.0,
                width: 100.0,
                height: 20.0,
            },
            ball: BallView {
                x: 400.0,
                y: 560.0,
                radius: 5.0,
            },
            bricks,
            score,
            lives,
            game_over,
        }
    }

    fn brick(x: f32) -> Rect {
        Rect {
            x,
            y: 50.0,
            width: 60.0,
            height: 30.0,
        }
    }

    fn initialized() -> Option<BreakoutState> {
        let mut state = None;
        BreakoutState::apply(
            &mut state,
            ServerMessage::Init {
                width: 800.0,
                height: 600.0,
                bricks: vec![brick(225.0), brick(295.0)],
                frame: frame(vec![true, true], 0, 3, false),
            },
        );
        state
    }

    #[test]
    fn frames_track_score_and_visible_bricks() {
        let mut state = initialized();

        let events = BreakoutState::apply(
            &mut state,
            ServerMessage::Frame {
                frame: frame(vec![false, true], 10, 3, false),
            },
        );
        assert_eq!(events, vec![BreakoutEvent::FrameUpdated { score: 10, lives: 3 }]);

        let game = state.unwrap();
        let visible: Vec<f32> = game.visible_bricks().map(|brick| brick.x).collect();
        assert_eq!(visible, vec![295.0]);
        assert!(!game.is_game_over());
    }

    #[test]
    fn game_over_records_the_final_score() {
        let mut state = initialized();
        BreakoutState::apply(
            &mut state,
            ServerMessage::Frame {
                frame: frame(vec![false, false], 20, 0, true),
            },
        );
        let events = BreakoutState::apply(&mut state, ServerMessage::GameOver { score: 20 });

        assert_eq!(events, vec![BreakoutEvent::GameOver { score: 20 }]);
        let game = state.unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.final_score, Some(20));
    }

    #[test]
    fn frames_before_init_are_dropped() {
        let mut state = None;
        let events = BreakoutState::apply(
            &mut state,
            ServerMessage::Frame {
                frame: frame(vec![], 0, 3, false),
            },
        );
        assert!(events.is_empty());
        assert!(state.is_none());
    }

    #[test]
    fn controls_need_a_connection() {
        let game = BreakoutGame::new("http://localhost:8000").unwrap();
        tokio_test::block_on(async {
            assert!(game.key_down(Direction::Left).await.is_err());
            assert!(game.restart().await.is_err());
            assert!(game.disconnect().await.is_ok());
        });
    }
}
