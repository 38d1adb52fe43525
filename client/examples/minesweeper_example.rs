use arcade_client::{BoardState, Cell, Difficulty, GameEvent, MinesweeperGame, Pos};
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let game = MinesweeperGame::new("http://localhost:8000")?;

    let mut event_receiver = game.subscribe_to_events().await;

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            match event {
                GameEvent::GameInitialized { rows, cols, mines } => {
                    println!("Game initialized: {}x{} with {} mines", rows, cols, mines);
                }
                GameEvent::BoardUpdated { changed_positions } => {
                    println!("{} cells updated", changed_positions.len());
                }
                GameEvent::GameStatusChanged { status } => {
                    if let Some(message) = status.message() {
                        println!("{}", message);
                    }
                }
                GameEvent::ConnectionLost => {
                    println!("Connection lost!");
                    break;
                }
            }
        }
    });

    game.start_game(Difficulty::Easy).await?;
    if let Some(id) = game.get_game_id().await {
        println!("Game started! Game ID: {}", id);
    }

    sleep(Duration::from_millis(100)).await;

    println!("\nRevealing cell (0, 0)...");
    game.reveal(Pos::new(0, 0)).await?;
    sleep(Duration::from_millis(100)).await;
    show(&game).await;

    println!("\nFlagging cell (1, 1)...");
    game.flag(Pos::new(1, 1)).await?;
    sleep(Duration::from_millis(100)).await;
    show(&game).await;

    println!("\nRevealing cell (4, 4)...");
    game.reveal(Pos::new(4, 4)).await?;
    sleep(Duration::from_millis(100)).await;
    show(&game).await;

    if let Some(state) = game.get_state().await {
        println!("Cell counts: {:?}", state.count_cells());
    }

    println!("\nRestarting on medium...");
    game.restart(Difficulty::Medium).await?;
    sleep(Duration::from_millis(100)).await;

    game.disconnect().await?;
    println!("Disconnected from game");

    event_handler.abort();
    let _ = event_handler.await;

    Ok(())
}

async fn show(game: &MinesweeperGame) {
    if let Some(state) = game.get_state().await {
        display_board(&state);
        println!(
            "Mines left: {}  Time: {}s",
            state.remaining_mines, state.elapsed_secs
        );
        if state.is_game_over() {
            println!("Game over! Won: {}", state.is_won());
        }
    }
}

fn display_board(state: &BoardState) {
    for (row, cells) in state.board.iter().enumerate() {
        print!("  ");
        for cell in cells {
            let symbol = match cell {
                Cell::Hidden => "·".to_string(),
                Cell::Flagged => "F".to_string(),
                Cell::Revealed { adjacent: 0 } => " ".to_string(),
                Cell::Revealed { adjacent } => adjacent.to_string(),
                Cell::Mine => "*".to_string(),
            };
            print!("{:>2}", symbol);
        }
        println!("  {}", row);
    }

    print!("  ");
    for col in 0..state.cols {
        print!("{:>2}", col % 10);
    }
    println!();
}
