#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub dx: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub speed: f32,
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brick {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
}

/// Playfield geometry and gameplay tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutConfig {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_speed: f32,
    pub ball_radius: f32,
    pub ball_speed: f32,
    pub speed_increment: f32,
    pub brick_rows: usize,
    pub brick_cols: usize,
    pub brick_width: f32,
    pub brick_height: f32,
    pub brick_padding: f32,
    pub brick_offset_top: f32,
    pub points_per_brick: u32,
    pub lives: u32,
    /// Stop checking bricks after the first hit in a tick.
    pub single_bounce: bool,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            paddle_width: 100.0,
            paddle_height: 20.0,
            paddle_speed: 10.0,
            ball_radius: 5.0,
            ball_speed: 5.0,
            speed_increment: 0.5,
            brick_rows: 5,
            brick_cols: 5,
            brick_width: 60.0,
            brick_height: 30.0,
            brick_padding: 10.0,
            brick_offset_top: 50.0,
            points_per_brick: 10,
            lives: 3,
            single_bounce: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Breakout {
    pub config: BreakoutConfig,
    pub paddle: Paddle,
    pub ball: Ball,
    pub bricks: Vec<Brick>,
    pub score: u32,
    pub lives: u32,
    pub game_over: bool,
}
