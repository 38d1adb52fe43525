use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    Result,
    client::{ArcadeClient, GameKind},
    websocket::GameSocket,
};

/// A local copy of one game's state, rebuilt from the server's messages.
pub trait Mirror: Sized + Clone + Send + Sync + 'static {
    type Outgoing: Serialize + Send + 'static;
    type Incoming: DeserializeOwned + Send + 'static;
    type Event: Send + 'static;

    const KIND: GameKind;

    /// Folds one server message into the mirror and reports what changed.
    fn apply(state: &mut Option<Self>, message: Self::Incoming) -> Vec<Self::Event>;

    fn connection_lost() -> Self::Event;
}

/// Connection state - all fields are required when connected
struct ConnectionState<Out> {
    websocket_sender: mpsc::UnboundedSender<Out>,
    game_id: String,
    background_task: JoinHandle<()>,
}

impl<Out> ConnectionState<Out> {
    fn send_message(&self, message: Out) -> Result<()> {
        self.websocket_sender
            .send(message)
            .map_err(|_| "WebSocket sender closed")?;
        Ok(())
    }

    async fn abort_and_wait_background_task(self) {
        self.background_task.abort();
        let _ = self.background_task.await;
    }
}

/// High-level game client that keeps a [`Mirror`] of the game up to date
pub struct GameHandle<M: Mirror> {
    client: ArcadeClient,
    connection_state: Arc<RwLock<Option<ConnectionState<M::Outgoing>>>>,
    event_sender: Arc<RwLock<Option<mpsc::UnboundedSender<M::Event>>>>,
    state: Arc<RwLock<Option<M>>>,
}

impl<M: Mirror> GameHandle<M> {
    /// Create a new game handle for the given server
    pub fn new(server_url: &str) -> Result<Self> {
        let client = ArcadeClient::new(server_url)?;
        Ok(Self {
            client,
            connection_state: Arc::new(RwLock::new(None)),
            event_sender: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(None)),
        })
    }

    pub fn client(&self) -> &ArcadeClient {
        &self.client
    }

    /// Subscribe to game events. Replaces any earlier subscription.
    pub async fn subscribe_to_events(&self) -> mpsc::UnboundedReceiver<M::Event> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.event_sender.write().await = Some(sender);
        receiver
    }

    /// Attach to an existing game, dropping any previous connection
    pub async fn join_game(&self, game_id: String) -> Result<()> {
        info!("Joining {:?} game with ID: {}", M::KIND, game_id);

        let mut conn_state = self.connection_state.write().await;

        if let Some(existing_conn) = conn_state.take() {
            existing_conn.abort_and_wait_background_task().await;
        }
        self.state.write().await.take();

        let ws_url = self.client.websocket_url(M::KIND, &game_id)?;
        let websocket = GameSocket::<M::Outgoing, M::Incoming>::connect(&ws_url).await?;
        let websocket_sender = websocket.get_sender();

        info!("Connected to game with ID: {}", game_id);

        let background_task = self.start_background_listener(websocket);

        *conn_state = Some(ConnectionState {
            websocket_sender,
            game_id,
            background_task,
        });

        Ok(())
    }

    pub(crate) async fn send_client_message(&self, message: M::Outgoing) -> Result<()> {
        let conn_state = self.connection_state.read().await;

        match conn_state.as_ref() {
            Some(conn) => conn.send_message(message),
            None => Err("Not connected to a game. Call start_game() first.".into()),
        }
    }

    /// Get the current game state
    pub async fn get_state(&self) -> Option<M> {
        self.state.read().await.clone()
    }

    /// Get the game ID
    pub async fn get_game_id(&self) -> Option<String> {
        let conn_state = self.connection_state.read().await;
        conn_state.as_ref().map(|conn| conn.game_id.clone())
    }

    /// Check if we're connected to a game
    pub async fn is_connected(&self) -> bool {
        self.connection_state.read().await.is_some()
    }

    /// Close the connection and clean up
    pub async fn disconnect(&self) -> Result<()> {
        if let Some(conn) = self.connection_state.write().await.take() {
            conn.abort_and_wait_background_task().await;
        }

        *self.event_sender.write().await = None;
        *self.state.write().await = None;

        info!("Disconnected from game");
        Ok(())
    }

    fn start_background_listener(
        &self,
        mut websocket: GameSocket<M::Outgoing, M::Incoming>,
    ) -> JoinHandle<()> {
        let state = self.state.clone();
        let event_sender = self.event_sender.clone();

        tokio::spawn(async move {
            Self::background_message_handler(&mut websocket, state, event_sender).await;
        })
    }

    async fn background_message_handler(
        websocket: &mut GameSocket<M::Outgoing, M::Incoming>,
        state: Arc<RwLock<Option<M>>>,
        event_sender: Arc<RwLock<Option<mpsc::UnboundedSender<M::Event>>>>,
    ) {
        loop {
            let message = match websocket.receive_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(e) => {
                    warn!("Error receiving WebSocket message: {}", e);
                    break;
                }
            };

            let events = {
                let mut state = state.write().await;
                M::apply(&mut *state, message)
            };

            if let Some(ref sender) = *event_sender.read().await {
                for event in events {
                    let _ = sender.send(event);
                }
            }
        }

        if let Some(ref sender) = *event_sender.read().await {
            let _ = sender.send(M::connection_lost());
        }
    }
}
