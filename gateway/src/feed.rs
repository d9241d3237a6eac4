//! Price-feed socket transport.
//!
//! The backend pushes whole-snapshot price messages over a WebSocket.
//! [`PriceFeedSocket`] is the seam the synchronizer depends on, so tests
//! can substitute a scripted fake; [`WsPriceFeed`] is the production
//! implementation.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::debug;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use certbook::ReferencePrices;

use crate::error::GatewayError;
use crate::wire::WirePrices;

/// Events emitted by one price-feed connection.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    /// A whole-snapshot price message
    Prices(ReferencePrices),
    /// The transport reported an error; the connection is finished
    Error(String),
    /// The backend closed the connection
    Closed,
}

/// One-shot socket connector for the price feed.
///
/// `connect` opens a single connection and returns its event stream. The
/// connection ends when the stream yields [`FeedEvent::Error`] or
/// [`FeedEvent::Closed`], or when the receiver is dropped — dropping the
/// receiver detaches the consumer before the underlying socket closes.
#[async_trait]
pub trait PriceFeedSocket: Send + Sync {
    async fn connect(&self) -> Result<mpsc::Receiver<FeedEvent>, GatewayError>;
}

/// WebSocket price feed over tokio-tungstenite.
pub struct WsPriceFeed {
    url: String,
}

impl WsPriceFeed {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl PriceFeedSocket for WsPriceFeed {
    async fn connect(&self) -> Result<mpsc::Receiver<FeedEvent>, GatewayError> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| GatewayError::Feed(e.to_string()))?;
        debug!("price feed connected: {}", self.url);

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let (mut write, mut read) = stream.split();
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        // Unknown message kinds are ignored; only
                        // whole-snapshot price messages are expected.
                        if let Ok(wire) = serde_json::from_str::<WirePrices>(&text) {
                            if tx.send(FeedEvent::Prices(wire.normalize())).await.is_err() {
                                // Receiver detached; stop reading and let
                                // the socket close on drop.
                                return;
                            }
                        }
                    }
                    Ok(Message::Ping(payload)) => {
                        let _ = write.send(Message::Pong(payload)).await;
                    }
                    Ok(Message::Close(_)) => {
                        let _ = tx.send(FeedEvent::Closed).await;
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = tx.send(FeedEvent::Error(e.to_string())).await;
                        return;
                    }
                }
            }
            let _ = tx.send(FeedEvent::Closed).await;
        });

        Ok(rx)
    }
}
