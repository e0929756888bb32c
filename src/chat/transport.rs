//! Live channel transport
//!
//! The Connection Manager only sees text frames through [`Channel`], so tests
//! can swap the WebSocket client for an in-memory pair.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::error::ChatResult;

/// An open bidirectional text channel
#[async_trait]
pub trait Channel: Send {
    /// Send one text frame
    async fn send_text(&mut self, text: String) -> ChatResult<()>;

    /// Wait for the next text frame; `None` once the channel is closed
    async fn next_text(&mut self) -> Option<ChatResult<String>>;
}

/// Opens channels
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> ChatResult<Box<dyn Channel>>;
}

/// WebSocket connector
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> ChatResult<Box<dyn Channel>> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        Ok(Box::new(WsChannel { stream }))
    }
}

/// A WebSocket carrying JSON text frames
pub struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Channel for WsChannel {
    async fn send_text(&mut self, text: String) -> ChatResult<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Option<ChatResult<String>> {
        while let Some(msg) = self.stream.next().await {
            match msg {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(frame = ?frame, "Server closed channel");
                    return None;
                }
                // Pings are answered by tungstenite itself
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Binary(bytes)) => {
                    tracing::debug!(len = bytes.len(), "Ignoring binary frame");
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }
}
