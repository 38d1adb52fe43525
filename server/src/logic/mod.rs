use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use rocket::futures::{SinkExt, future::join_all, stream::SplitSink};
use rocket_ws::{Message, stream::DuplexStream};
use serde::Serialize;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub mod breakout;
pub mod minesweeper;

pub type Games<G> = Arc<DashMap<String, Arc<Mutex<G>>>>;

pub type WsSink = SplitSink<DuplexStream, Message>;

/// Anything the cleanup task can sweep out of a [`Games`] map.
pub trait Session: Send + 'static {
    fn connections(&self) -> &Connections;

    fn should_cleanup(&self, inactive_timeout_secs: u64) -> bool {
        let connections = self.connections();
        if connections.is_active() {
            return false;
        }

        connections.idle_secs() > inactive_timeout_secs
    }

    /// Called right before the session is dropped from its map.
    fn shutdown(&mut self) {}
}

async fn send<M: Serialize>(stream: &mut WsSink, message: &M) {
    match serde_json::to_string(message) {
        Ok(text) => {
            let _ = stream.send(Message::Text(text)).await;
        }
        Err(e) => warn!("Failed to serialize outgoing message: {}", e),
    }
}

/// The WebSocket streams attached to one session, plus its activity clock.
pub struct Connections {
    streams: HashMap<Uuid, WsSink>,
    last_activity: Instant,
}

impl Default for Connections {
    fn default() -> Self {
        Self::new()
    }
}

impl Connections {
    pub fn new() -> Self {
        Self {
            streams: HashMap::new(),
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_secs(&self) -> u64 {
        Instant::now().duration_since(self.last_activity).as_secs()
    }

    pub fn is_active(&self) -> bool {
        !self.streams.is_empty()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Sends `init` to the new stream only, then starts including it in broadcasts.
    pub async fn add<M: Serialize>(&mut self, mut stream: WsSink, init: &M) -> Uuid {
        let id = Uuid::new_v4();
        debug!("Adding stream {} to game", id);
        send(&mut stream, init).await;
        self.streams.insert(id, stream);
        self.touch();
        info!("Stream {} added, total connections: {}", id, self.streams.len());
        id
    }

    pub fn remove(&mut self, id: &Uuid) {
        if self.streams.remove(id).is_some() {
            info!(
                "Stream {} removed, remaining connections: {}",
                id,
                self.streams.len()
            );
        } else {
            warn!("Attempted to remove non-existent stream: {}", id);
        }
        self.touch();
    }

    pub async fn broadcast<M: Serialize>(&mut self, message: &M) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize broadcast: {}", e);
                return;
            }
        };

        let futures: Vec<_> = self
            .streams
            .values_mut()
            .map(|stream| stream.send(Message::Text(text.clone())))
            .collect();

        join_all(futures).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle(Connections);

    impl Session for Idle {
        fn connections(&self) -> &Connections {
            &self.0
        }
    }

    #[test]
    fn fresh_session_is_kept() {
        let session = Idle(Connections::new());
        assert!(!session.connections().is_active());
        assert!(!session.should_cleanup(60));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_without_streams_is_swept() {
        let session = Idle(Connections::new());
        tokio::time::advance(std::time::Duration::from_secs(120)).await;
        assert_eq!(session.connections().idle_secs(), 120);
        assert!(session.should_cleanup(60));
        assert!(!session.should_cleanup(600));
    }
}
