//! Minesweeper and breakout game server.
//!
//! Both games are pure state machines in [`logic`]; sessions wrap them with
//! the WebSocket streams that render their updates.

use std::sync::Arc;

use dashmap::DashMap;
use rocket::{
    Build, Rocket,
    fairing::{Fairing, Info, Kind},
    routes,
};
use tracing::{info, warn};

pub mod cleanup;
pub mod config;
pub mod cors;
pub mod data;
pub mod logic;
pub mod rate_limit;
pub mod routes;

use crate::{
    cleanup::{start_cleanup_task, start_rate_limit_sweep},
    cors::create_cors,
    logic::{Games, breakout::BreakoutGame, minesweeper::MinesweeperGame},
    rate_limit::{RateLimiter, create_rate_limiter},
};

struct CleanupFairing;

#[rocket::async_trait]
impl Fairing for CleanupFairing {
    fn info(&self) -> Info {
        Info {
            name: "Cleanup Task",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        match rocket.state::<Games<MinesweeperGame>>() {
            Some(games) => {
                tokio::spawn(start_cleanup_task(games.clone(), "minesweeper"));
            }
            None => warn!("Failed to get minesweeper games state for cleanup task"),
        }
        match rocket.state::<Games<BreakoutGame>>() {
            Some(games) => {
                tokio::spawn(start_cleanup_task(games.clone(), "breakout"));
            }
            None => warn!("Failed to get breakout games state for cleanup task"),
        }
        match rocket.state::<RateLimiter>() {
            Some(rate_limiter) => {
                tokio::spawn(start_rate_limit_sweep(rate_limiter.clone()));
            }
            None => warn!("Failed to get rate limiter state for cleanup task"),
        }
        info!("Started cleanup tasks for game management");
        Ok(rocket)
    }
}

/// The fully configured server, without launching it.
pub fn build() -> Rocket<Build> {
    let minesweeper_games: Games<MinesweeperGame> = Arc::new(DashMap::new());
    let breakout_games: Games<BreakoutGame> = Arc::new(DashMap::new());

    rocket::build()
        .attach(create_cors())
        .attach(CleanupFairing)
        .manage(minesweeper_games)
        .manage(breakout_games)
        .manage(create_rate_limiter())
        .mount(
            "/",
            routes![
                routes::minesweeper::create_minesweeper,
                routes::minesweeper::minesweeper_socket,
                routes::breakout::create_breakout,
                routes::breakout::breakout_socket,
            ],
        )
}
