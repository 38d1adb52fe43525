use rocket::{State, futures::StreamExt, get, http::Status, post, serde::json::Json};
use rocket_ws::{Channel, Message, WebSocket};
use tracing::{debug, error, info, instrument, warn};

use arcade_common::{models::CreateResponse, protocol::breakout::ClientMessage};

use super::{add_game, find_game};
use crate::{
    config,
    logic::{
        Games,
        breakout::{BreakoutGame, start_ticker},
    },
    rate_limit::{ClientIp, RateLimiter, check_rate_limit},
};

#[post("/breakout/create")]
#[instrument(level = "trace", skip(games, rate_limiter), fields(client_ip = %client_ip.0))]
pub fn create_breakout(
    games: &State<Games<BreakoutGame>>,
    rate_limiter: &State<RateLimiter>,
    client_ip: ClientIp,
) -> Result<Json<CreateResponse>, Status> {
    info!("Breakout creation request from {}", client_ip.0);

    check_rate_limit(rate_limiter, &client_ip)?;

    let game = BreakoutGame::new(config::breakout_config(), config::breakout_tick_interval());
    let (id, _) = add_game(games, game);

    info!(
        "Successfully created breakout game {} for client {}",
        id, client_ip.0
    );
    Ok(Json(CreateResponse { id }))
}

/// The ball starts moving once the first viewer is attached.
#[get("/breakout/ws?<id>")]
#[instrument(level = "trace", skip(ws, games), fields(game_id = %id))]
pub fn breakout_socket(
    ws: WebSocket,
    games: &State<Games<BreakoutGame>>,
    id: String,
) -> Result<Channel<'static>, Status> {
    let Some(game) = find_game(games, &id) else {
        warn!("WebSocket connection attempt for non-existent game: {}", id);
        return Err(Status::NotFound);
    };
    info!("WebSocket connection established for breakout game: {}", id);

    Ok(ws.channel(move |stream| {
        let game_id = id.clone();
        Box::pin(async move {
            let (write, mut read) = stream.split();

            let stream_id = {
                let mut game = game.lock().await;
                game.add_stream(write).await
            };
            start_ticker(&game).await;

            info!(
                "Client connected to game {} (stream: {})",
                game_id, stream_id
            );

            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::KeyDown { direction }) => {
                            game.lock().await.key_down(direction);
                        }
                        Ok(ClientMessage::KeyUp { direction }) => {
                            game.lock().await.key_up(direction);
                        }
                        Ok(ClientMessage::Restart) => {
                            info!("Player restarting breakout game {}", game_id);
                            {
                                let mut game = game.lock().await;
                                game.restart().await;
                            }
                            start_ticker(&game).await;
                        }
                        Err(e) => {
                            warn!(
                                "Invalid message format in game {}: {} - Error: {}",
                                game_id, text, e
                            );
                        }
                    },
                    Ok(Message::Close(_)) => {
                        info!(
                            "WebSocket connection closed for game {} (stream: {})",
                            game_id, stream_id
                        );
                        break;
                    }
                    Err(e) => {
                        error!(
                            "WebSocket error in game {} (stream: {}): {}",
                            game_id, stream_id, e
                        );
                        break;
                    }
                    Ok(_) => {
                        debug!("Received non-text message in game {}, ignoring", game_id);
                    }
                }
            }

            game.lock().await.remove_stream(&stream_id);

            info!(
                "Client disconnected from game {} (stream: {})",
                game_id, stream_id
            );
            Ok(())
        })
    }))
}
