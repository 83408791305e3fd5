use crate::error::SignalingError;
use crate::signaling::{RelayConnector, RelayLink};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use lounge_core::SignalMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Connects to a relay websocket endpoint such as `ws://host:port/ws`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl RelayConnector for WsConnector {
    async fn connect(&self) -> Result<RelayLink, SignalingError> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| SignalingError::Connect(format!("{}: {}", self.url, e)))?;
        info!("Connected to relay at {}", self.url);

        let (mut ws_write, mut ws_read) = ws_stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<SignalMessage>();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode '{}': {}", msg.event_name(), e);
                        continue;
                    }
                };
                if ws_write.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_write.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = ws_read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<SignalMessage>(text.as_str()) {
                            Ok(msg) => {
                                if inbound_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Malformed relay frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay socket error: {}", e);
                        break;
                    }
                }
            }
            debug!("Relay reader finished");
        });

        Ok(RelayLink { outbound, inbound })
    }
}
