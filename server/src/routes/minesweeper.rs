use rocket::{State, futures::StreamExt, get, http::Status, post, serde::json::Json};
use rocket_ws::{Channel, Message, WebSocket};
use tracing::{debug, error, info, instrument, warn};

use arcade_common::{
    models::{CreateResponse, NewMinesweeper},
    protocol::minesweeper::ClientMessage,
};

use super::{add_game, find_game};
use crate::{
    logic::{Games, minesweeper::MinesweeperGame},
    rate_limit::{ClientIp, RateLimiter, check_rate_limit},
};

#[post("/minesweeper/create", data = "<request>")]
#[instrument(level = "trace", skip(games, rate_limiter), fields(client_ip = %client_ip.0, difficulty = ?request.difficulty))]
pub fn create_minesweeper(
    request: Json<NewMinesweeper>,
    games: &State<Games<MinesweeperGame>>,
    rate_limiter: &State<RateLimiter>,
    client_ip: ClientIp,
) -> Result<Json<CreateResponse>, Status> {
    info!(
        "Minesweeper creation request from {}: {:?}",
        client_ip.0, request.difficulty
    );

    check_rate_limit(rate_limiter, &client_ip)?;

    let (id, _) = add_game(games, MinesweeperGame::new(request.difficulty));

    info!(
        "Successfully created minesweeper game {} for client {}",
        id, client_ip.0
    );
    Ok(Json(CreateResponse { id }))
}

#[get("/minesweeper/ws?<id>")]
#[instrument(level = "trace", skip(ws, games), fields(game_id = %id))]
pub fn minesweeper_socket(
    ws: WebSocket,
    games: &State<Games<MinesweeperGame>>,
    id: String,
) -> Result<Channel<'static>, Status> {
    let Some(game) = find_game(games, &id) else {
        warn!("WebSocket connection attempt for non-existent game: {}", id);
        return Err(Status::NotFound);
    };
    info!("WebSocket connection established for minesweeper game: {}", id);

    Ok(ws.channel(move |stream| {
        let game_id = id.clone();
        Box::pin(async move {
            let (write, mut read) = stream.split();

            let stream_id = {
                let mut game = game.lock().await;
                game.add_stream(write).await
            };

            info!(
                "Client connected to game {} (stream: {})",
                game_id, stream_id
            );

            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            debug!("Received message from game {}: {:?}", game_id, message);
                            let mut game = game.lock().await;
                            match message {
                                ClientMessage::Reveal { pos } => {
                                    game.reveal(pos).await;
                                }
                                ClientMessage::Flag { pos } => {
                                    game.flag(pos).await;
                                }
                                ClientMessage::Restart { difficulty } => {
                                    game.restart(difficulty).await;
                                }
                            }
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
