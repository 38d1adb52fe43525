use arcade_common::models::{CreateResponse, Difficulty, NewMinesweeper};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::Result;

/// Which game a server endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    Minesweeper,
    Breakout,
}

impl GameKind {
    fn path(self) -> &'static str {
        match self {
            GameKind::Minesweeper => "minesweeper",
            GameKind::Breakout => "breakout",
        }
    }
}

/// HTTP client for the arcade server API
#[derive(Clone)]
pub struct ArcadeClient {
    client: Client,
    base_url: Url,
}

impl ArcadeClient {
    /// Create a new client connecting to the specified server URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::new();

        Ok(Self { client, base_url })
    }

    /// Create a new minesweeper game and return its id
    pub async fn create_minesweeper(&self, difficulty: Difficulty) -> Result<String> {
        self.create(GameKind::Minesweeper, &NewMinesweeper { difficulty })
            .await
    }

    /// Create a new breakout game and return its id
    pub async fn create_breakout(&self) -> Result<String> {
        self.create(GameKind::Breakout, &serde_json::json!({})).await
    }

    async fn create<B: Serialize>(&self, kind: GameKind, body: &B) -> Result<String> {
        let create_url = self.base_url.join(&format!("/{}/create", kind.path()))?;

        let response = self.client.post(create_url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(format!("Failed to create {:?} game: {}", kind, response.status()).into());
        }

        let create_response: CreateResponse = response.json().await?;
        Ok(create_response.id)
    }

    /// Get the WebSocket URL for a game
    pub fn websocket_url(&self, kind: GameKind, game_id: &str) -> Result<String> {
        let mut ws_url = self.base_url.clone();
        ws_url
            .set_scheme(match self.base_url.scheme() {
                "https" => "wss",
                _ => "ws",
            })
            .map_err(|_| "Failed to set WebSocket scheme")?;
        ws_url.set_path(&format!("/{}/ws", kind.path()));
        ws_url.query_pairs_mut().clear().append_pair("id", game_id);

        Ok(ws_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_urls_follow_the_http_scheme() {
        let client = ArcadeClient::new("http://localhost:8000").unwrap();
        assert_eq!(
            client.websocket_url(GameKind::Minesweeper, "abc12").unwrap(),
            "ws://localhost:8000/minesweeper/ws?id=abc12"
        );

        let client = ArcadeClient::new("https://arcade.example.com/ignored?x=1").unwrap();
        assert_eq!(
            client.websocket_url(GameKind::Breakout, "Z_9-q").unwrap(),
            "wss://arcade.example.com/breakout/ws?id=Z_9-q"
        );
    }

    #[test]
    fn rejects_invalid_base_urls() {
        assert!(ArcadeClient::new("not a url").is_err());
    }
}
