use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use crate::{
    config::env_or,
    logic::{Games, Session},
    rate_limit::{RateLimiter, sweep_idle_buckets},
};

pub async fn start_cleanup_task<G: Session>(games: Games<G>, kind: &'static str) {
    let cleanup_interval_secs: u64 = env_or("CLEANUP_INTERVAL_SECONDS", 60);
    let inactive_timeout_secs: u64 = env_or("INACTIVE_GAME_TIMEOUT_SECONDS", 600);

    let mut interval = time::interval(Duration::from_secs(cleanup_interval_secs.max(1)));

    info!(
        "Started {} cleanup task: checking every {}s, inactive timeout: {}s",
        kind, cleanup_interval_secs, inactive_timeout_secs
    );

    loop {
        interval.tick().await;
        cleanup_games(&games, inactive_timeout_secs, kind);
    }
}

pub async fn start_rate_limit_sweep(rate_limiter: RateLimiter) {
    let cleanup_interval_secs: u64 = env_or("CLEANUP_INTERVAL_SECONDS", 60);
    let mut interval = time::interval(Duration::from_secs(cleanup_interval_secs.max(1)));

    loop {
        interval.tick().await;
        let removed = sweep_idle_buckets(&rate_limiter);
        if removed > 0 {
            debug!("Dropped {} idle rate limit buckets", removed);
        }
    }
}

pub fn cleanup_games<G: Session>(games: &Games<G>, inactive_timeout_secs: u64, kind: &str) -> usize {
    let mut games_to_remove = Vec::new();

    for entry in games.iter() {
        // A locked game is in use, so it is not idle.
        if let Ok(mut game) = entry.value().try_lock()
            && game.should_cleanup(inactive_timeout_secs)
        {
            game.shutdown();
            games_to_remove.push(entry.key().clone());
        }
    }

    let removed_count = games_to_remove.len();
    for game_id in games_to_remove {
        games.remove(&game_id);
        debug!("Cleaned up {} game: {}", kind, game_id);
    }

    if removed_count > 0 {
        info!("Cleaned up {} inactive {} games", removed_count, kind);
    }
    removed_count
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arcade_common::models::Difficulty;
    use dashmap::DashMap;
    use tokio::sync::Mutex;

    use super::*;
    use crate::logic::minesweeper::MinesweeperGame;

    #[tokio::test(start_paused = true)]
    async fn only_idle_games_are_removed() {
        let games: Games<MinesweeperGame> = Arc::new(DashMap::new());
        games.insert(
            "fresh".to_string(),
            Arc::new(Mutex::new(MinesweeperGame::new(Difficulty::Easy))),
        );

        assert_eq!(cleanup_games(&games, 600, "minesweeper"), 0);
        assert!(games.contains_key("fresh"));

        time::advance(Duration::from_secs(2)).await;
        assert_eq!(cleanup_games(&games, 0, "minesweeper"), 1);
        assert!(games.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn locked_games_are_skipped() {
        let games: Games<MinesweeperGame> = Arc::new(DashMap::new());
        let game = Arc::new(Mutex::new(MinesweeperGame::new(Difficulty::Easy)));
        games.insert("busy".to_string(), Arc::clone(&game));

        time::advance(Duration::from_secs(2)).await;
        let _guard = game.lock().await;
        assert_eq!(cleanup_games(&games, 0, "minesweeper"), 0);
        assert_eq!(games.len(), 1);
    }
}
