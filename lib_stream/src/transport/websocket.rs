//! # WebSocket Transport
//!
//! `tokio-tungstenite` client connection to the ticketed stream endpoint.
//! WebSocket ping/pong frames are answered by tungstenite itself and surface
//! here as [`Frame::Empty`]; a close frame or the end of the stream is a
//! transport failure.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{protocol::Message as WsMessage, Error as WsError},
    MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::errors::{Result, StreamError};
use crate::transport::{Frame, StreamConnection, StreamTransport};

/// Opens WebSocket connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

impl WsTransport {
    /// Creates the transport.
    pub fn new() -> Self {
        Self
    }
}

/// The endpoint without its query, so tickets never reach the logs.
fn loggable(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

#[async_trait]
impl StreamTransport for WsTransport {
    type Connection = WsConnection;

    async fn open(&self, url: &Url) -> Result<WsConnection> {
        log::info!("Opening stream connection to {}", loggable(url));
        let (stream, response) = connect_async(url.as_str()).await?;
        log::debug!("Stream handshake completed with HTTP {}", response.status());
        Ok(WsConnection { stream })
    }
}

/// An open WebSocket stream.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl StreamConnection for WsConnection {
    async fn send(&mut self, text: String) -> Result<()> {
        self.stream.send(WsMessage::Text(text.into())).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Frame> {
        match self.stream.next().await {
            Some(Ok(WsMessage::Text(text))) => Ok(Frame::Text(text.to_string())),
            Some(Ok(WsMessage::Binary(bytes))) => Ok(String::from_utf8(bytes.to_vec())
                .map(Frame::Text)
                .unwrap_or(Frame::Empty)),
            Some(Ok(WsMessage::Close(frame))) => Err(StreamError::TransportFailure(format!(
                "connection closed by peer ({:?})",
                frame
            ))),
            Some(Ok(_)) => Ok(Frame::Empty),
            Some(Err(e)) => Err(e.into()),
            None => Err(StreamError::TransportFailure("stream ended".to_string())),
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
