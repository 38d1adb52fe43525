use arcade_client::{BreakoutEvent, BreakoutGame, Direction};
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let game = BreakoutGame::new("http://localhost:8000")?;
    let mut events = game.subscribe_to_events().await;

    game.start_game().await?;
    if let Some(id) = game.get_game_id().await {
        println!("Game started! Game ID: {}", id);
    }

    // Sweep the paddle back and forth until the game ends.
    let mut direction = Direction::Left;
    let mut frames = 0u32;
    while let Some(event) = events.recv().await {
        match event {
            BreakoutEvent::Initialized {
                width,
                height,
                bricks,
            } => {
                println!("Playfield {}x{} with {} bricks", width, height, bricks);
                game.key_down(direction).await?;
            }
            BreakoutEvent::FrameUpdated { score, lives } => {
                frames += 1;
                if frames % 60 == 0 {
                    println!("score {} lives {}", score, lives);
                    game.key_up(direction).await?;
                    direction = match direction {
                        Direction::Left => Direction::Right,
                        Direction::Right => Direction::Left,
                    };
                    game.key_down(direction).await?;
                }
            }
            BreakoutEvent::GameOver { score } => {
                println!("Game Over! Final score: {}", score);
                break;
            }
            BreakoutEvent::ConnectionLost => {
                println!("Connection lost!");
                break;
            }
        }
    }

    if let Some(state) = game.get_state().await {
        println!("{} bricks left standing", state.visible_bricks().count());
    }

    sleep(Duration::from_millis(100)).await;
    game.disconnect().await?;
    println!("Disconnected from game");

    Ok(())
}
