use crate::error::SignalingError;
use async_trait::async_trait;
use lounge_core::SignalMessage;
use tokio::sync::mpsc;

/// Both directions of an established relay connection.
pub struct RelayLink {
    /// Client -> relay.
    pub outbound: mpsc::UnboundedSender<SignalMessage>,
    /// Relay -> client. Closes when the relay connection drops.
    pub inbound: mpsc::UnboundedReceiver<SignalMessage>,
}

#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self) -> Result<RelayLink, SignalingError>;
}
