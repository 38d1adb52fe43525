use std::sync::Arc;

use dashmap::Entry;
use nanoid::nanoid;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::logic::Games;

pub mod breakout;
pub mod minesweeper;

/// Stores `game` under a fresh short id, growing the id after repeated
/// collisions.
#[instrument(level = "trace", skip(games, game))]
fn add_game<G>(games: &Games<G>, game: G) -> (String, Arc<Mutex<G>>) {
    let mut id_length = 5;
    let max_attempts_per_length = 10;

    loop {
        for _ in 0..max_attempts_per_length {
            let id = nanoid!(id_length);
            match games.entry(id.clone()) {
                Entry::Occupied(_) => {
                    debug!("Game ID collision, trying another: {}", id);
                    continue;
                }
                Entry::Vacant(entry) => {
                    let game = Arc::new(Mutex::new(game));
                    entry.insert(Arc::clone(&game));
                    info!("Created new game with ID: {}", id);
                    return (id, game);
                }
            }
        }

        warn!(
            "Exhausted ID attempts at length {}, increasing to {}",
            id_length,
            id_length + 1
        );
        id_length += 1;
    }
}

fn find_game<G>(games: &Games<G>, id: &str) -> Option<Arc<Mutex<G>>> {
    games.get(id).map(|entry| Arc::clone(entry.value()))
}
