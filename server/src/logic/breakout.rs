use std::{sync::Arc, time::Duration};

use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use arcade_common::{
    models::{BallView, Direction, Frame, Rect},
    protocol::breakout::ServerMessage,
};

use super::{Connections, Session, WsSink};
use crate::data::{Ball, Breakout, BreakoutConfig, Brick, Paddle};

pub type SharedBreakout = Arc<Mutex<BreakoutGame>>;

impl Paddle {
    fn new(config: &BreakoutConfig) -> Self {
        Self {
            x: config.width / 2.0 - config.paddle_width / 2.0,
            y: config.height - config.paddle_height - 10.0,
            width: config.paddle_width,
            height: config.paddle_height,
            dx: 0.0,
        }
    }

    fn center(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

impl Ball {
    fn new(config: &BreakoutConfig) -> Self {
        Self {
            x: config.width / 2.0,
            y: config.height - config.paddle_height - 20.0,
            radius: config.ball_radius,
            speed: config.ball_speed,
            dx: config.ball_speed,
            dy: -config.ball_speed,
        }
    }
}

impl Brick {
    fn overlaps(&self, ball: &Ball) -> bool {
        ball.x + ball.radius > self.x
            && ball.x - ball.radius < self.x + self.width
            && ball.y + ball.radius > self.y
            && ball.y - ball.radius < self.y + self.height
    }

    fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Lays the wall out row by row, centered horizontally.
fn build_bricks(config: &BreakoutConfig) -> Vec<Brick> {
    let pitch_x = config.brick_width + config.brick_padding;
    let pitch_y = config.brick_height + config.brick_padding;
    let offset_x = (config.width - config.brick_cols as f32 * pitch_x) / 2.0;

    (0..config.brick_rows)
        .flat_map(|row| (0..config.brick_cols).map(move |col| (row, col)))
        .map(|(row, col)| Brick {
            x: offset_x + col as f32 * pitch_x,
            y: config.brick_offset_top + row as f32 * pitch_y,
            width: config.brick_width,
            height: config.brick_height,
            visible: true,
        })
        .collect()
}

/// What happened during one physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub bricks_hit: u32,
    pub paddle_hit: bool,
    pub life_lost: bool,
    pub game_over: bool,
}

impl Breakout {
    pub fn new(config: BreakoutConfig) -> Self {
        Self {
            paddle: Paddle::new(&config),
            ball: Ball::new(&config),
            bricks: build_bricks(&config),
            score: 0,
            lives: config.lives,
            game_over: false,
            config,
        }
    }

    /// Fresh wall, score, lives and ball. The paddle stays where it is.
    pub fn restart(&mut self) {
        self.score = 0;
        self.lives = self.config.lives;
        self.game_over = false;
        self.bricks = build_bricks(&self.config);
        self.reset_ball();
    }

    pub fn reset_ball(&mut self) {
        self.ball = Ball::new(&self.config);
    }

    pub fn key_down(&mut self, direction: Direction) {
        self.paddle.dx = match direction {
            Direction::Left => -self.config.paddle_speed,
            Direction::Right => self.config.paddle_speed,
        };
    }

    /// Releasing either arrow stops the paddle.
    pub fn key_up(&mut self) {
        self.paddle.dx = 0.0;
    }

    /// Advances one frame. Returns `None` once the game is over.
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.game_over {
            return None;
        }

        self.move_paddle();
        self.ball.x += self.ball.dx;
        self.ball.y += self.ball.dy;

        let bricks_hit = self.collide_bricks();
        let paddle_hit = self.collide_paddle();
        self.collide_walls();
        let life_lost = self.collide_bottom();

        Some(TickReport {
            bricks_hit,
            paddle_hit,
            life_lost,
            game_over: self.game_over,
        })
    }

    fn move_paddle(&mut self) {
        let paddle = &mut self.paddle;
        paddle.x += paddle.dx;
        if paddle.x < 0.0 {
            paddle.x = 0.0;
        }
        if paddle.x + paddle.width > self.config.width {
            paddle.x = self.config.width - paddle.width;
        }
    }

    // Each overlapping brick flips the ball again unless `single_bounce` is set.
    fn collide_bricks(&mut self) -> u32 {
        let mut hits = 0;
        for brick in self.bricks.iter_mut().filter(|brick| brick.visible) {
            if !brick.overlaps(&self.ball) {
                continue;
            }

            self.ball.dy = -self.ball.dy;
            brick.visible = false;
            self.score += self.config.points_per_brick;
            hits += 1;

            if self.config.single_bounce {
                break;
            }
        }
        hits
    }

    fn collide_paddle(&mut self) -> bool {
        let ball = &mut self.ball;
        let paddle = &self.paddle;
        if ball.x + ball.radius > paddle.x
            && ball.x - ball.radius < paddle.x + paddle.width
            && ball.y + ball.radius > paddle.y
        {
            ball.dy = -ball.dy;
            ball.speed += self.config.speed_increment;
            // -1 at the left edge, 0 at the center, 1 at the right edge
            let hit_point = (ball.x - paddle.center()) / (paddle.width / 2.0);
            ball.dx = hit_point * ball.speed;
            return true;
        }
        false
    }

    fn collide_walls(&mut self) {
        let ball = &mut self.ball;
        if ball.x + ball.radius > self.config.width || ball.x - ball.radius < 0.0 {
            ball.dx = -ball.dx;
        }
        if ball.y - ball.radius < 0.0 {
            ball.dy = -ball.dy;
        }
    }

    fn collide_bottom(&mut self) -> bool {
        if self.ball.y + self.ball.radius <= self.config.height {
            return false;
        }

        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.game_over = true;
        } else {
            self.reset_ball();
        }
        true
    }

    pub fn brick_rects(&self) -> Vec<Rect> {
        self.bricks.iter().map(Brick::rect).collect()
    }

    pub fn frame(&self) -> Frame {
        Frame {
            paddle: Rect {
                x: self.paddle.x,
                y: self.paddle.y,
                width: self.paddle.width,
                height: self.paddle.height,
            },
            ball: BallView {
                x: self.ball.x,
                y: self.ball.y,
                radius: self.ball.radius,
            },
            bricks: self.bricks.iter().map(|brick| brick.visible).collect(),
            score: self.score,
            lives: self.lives,
            game_over: self.game_over,
        }
    }
}

/// A breakout game with its own ticker task and any number of viewers.
pub struct BreakoutGame {
    engine: Breakout,
    tick_interval: Duration,
    connections: Connections,
    ticker: Option<JoinHandle<()>>,
}

impl Session for BreakoutGame {
    fn connections(&self) -> &Connections {
        &self.connections
    }

    fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            debug!("Breakout ticker aborted");
        }
    }
}

impl BreakoutGame {
    #[instrument(level = "trace")]
    pub fn new(config: BreakoutConfig, tick_interval: Duration) -> Self {
        info!(
            "Creating new breakout game: {}x{} bricks, {} lives, single bounce: {}",
            config.brick_rows, config.brick_cols, config.lives, config.single_bounce
        );
        Self {
            engine: Breakout::new(config),
            tick_interval,
            connections: Connections::new(),
            ticker: None,
        }
    }

    pub fn engine(&self) -> &Breakout {
        &self.engine
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    pub fn init_message(&self) -> ServerMessage {
        ServerMessage::Init {
            width: self.engine.config.width,
            height: self.engine.config.height,
            bricks: self.engine.brick_rects(),
            frame: self.engine.frame(),
        }
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

    pub fn key_down(&mut self, direction: Direction) {
        debug!("Paddle key down: {:?}", direction);
        self.connections.touch();
        self.engine.key_down(direction);
    }

    pub fn key_up(&mut self, direction: Direction) {
        debug!("Paddle key up: {:?}", direction);
        self.connections.touch();
        self.engine.key_up();
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn restart(&mut self) {
        info!("Restarting breakout game");
        self.engine.restart();
        self.connections.touch();
        let message = self.init_message();
        self.connections.broadcast(&message).await;
    }

    /// Runs one physics step and broadcasts the result. Returns `false` once
    /// there is nothing left to tick.
    pub async fn step(&mut self) -> bool {
        let Some(report) = self.engine.tick() else {
            return false;
        };

        if report.bricks_hit > 0 {
            debug!(
                "{} brick(s) hit, score {}",
                report.bricks_hit, self.engine.score
            );
        }
        if report.life_lost {
            info!("Ball lost, {} lives left", self.engine.lives);
        }

        let frame = ServerMessage::Frame {
            frame: self.engine.frame(),
        };
        self.connections.broadcast(&frame).await;

        if report.game_over {
            info!("Breakout game over with score {}", self.engine.score);
            let message = ServerMessage::GameOver {
                score: self.engine.score,
            };
            self.connections.broadcast(&message).await;
            return false;
        }

        true
    }
}

/// Spawns the frame loop unless one is already running or the game is over.
pub async fn start_ticker(game: &SharedBreakout) {
    let mut guard = game.lock().await;
    if guard.is_ticking() || guard.engine.game_over {
        return;
    }

    let period = guard.tick_interval;
    let game = Arc::clone(game);
    guard.ticker = Some(tokio::spawn(run_ticker(game, period)));
    debug!("Breakout ticker started at {:?} per frame", period);
}

async fn run_ticker(game: SharedBreakout, period: Duration) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let mut game = game.lock().await;
        if !game.step().await {
            // Cleared while still holding the lock; the next start_ticker spawns anew.
            game.ticker = None;
            break;
        }
    }

    debug!("Breakout ticker stopped");
}
