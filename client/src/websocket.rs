use std::marker::PhantomData;

use arcade_common::protocol::{breakout, minesweeper};
use futures_util::{SinkExt, StreamExt, stream::SplitStream};
use serde::{Serialize, de::DeserializeOwned};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsReader = SplitStream<WsStream>;

pub type MinesweeperSocket = GameSocket<minesweeper::ClientMessage, minesweeper::ServerMessage>;
pub type BreakoutSocket = GameSocket<breakout::ClientMessage, breakout::ServerMessage>;

/// WebSocket connection to one game, sending `Out` and receiving `In`.
pub struct GameSocket<Out, In> {
    sender: mpsc::UnboundedSender<Out>,
    reader: WsReader,
    writer_task: JoinHandle<()>,
    incoming: PhantomData<fn() -> In>,
}

impl<Out, In> GameSocket<Out, In>
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned,
{
    /// Connect to a game via WebSocket
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to WebSocket: {}", url);

        let (ws_stream, _) = connect_async(url).await?;
        info!("WebSocket connected successfully");

        let (mut writer, reader) = ws_stream.split();

        // All outgoing messages funnel through this channel into the writer task.
        let (sender, mut receiver) = mpsc::unbounded_channel::<Out>();

        let writer_task = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                debug!("Sending message: {}", json);
                if let Err(e) = writer.send(Message::Text(json.into())).await {
                    warn!("Failed to send WebSocket message: {}", e);
                    break;
                }
            }

            let _ = writer.close().await;
        });

        Ok(Self {
            sender,
            reader,
            writer_task,
            incoming: PhantomData,
        })
    }

    /// Get a cloneable sender for sending messages
    pub fn get_sender(&self) -> mpsc::UnboundedSender<Out> {
        self.sender.clone()
    }

    /// Send a client message to the server
    pub fn send_message(&self, message: Out) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| "WebSocket sender channel closed")?;
        Ok(())
    }

    /// Receive the next server message.
    /// Returns None if the connection is closed
    pub async fn receive_message(&mut self) -> Result<Option<In>> {
        while let Some(msg) = self.reader.next().await {
            match msg? {
                Message::Text(text) => {
                    debug!("Received message: {}", text.as_str());
                    return Ok(Some(serde_json::from_str(&text)?));
                }
                Message::Close(_) => {
                    info!("WebSocket connection closed");
                    return Ok(None);
                }
                // ping/pong and binary frames carry nothing for us
                _ => continue,
            }
        }

        Ok(None)
    }

    /// Close the WebSocket connection
    pub async fn close(self) -> Result<()> {
        // Dropping the sender ends the writer loop.
        drop(self.sender);

        let _ = self.writer_task.await;

        Ok(())
    }
}
