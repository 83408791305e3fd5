use anyhow::{Context, Result};
use lounge_core::{Identity, SignalMessage};
use lounge_relay::{RelayConnection, RelayService};
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single relay round trip (ms).
pub const RELAY_TIMEOUT_MS: u64 = 2000;

/// A scripted relay participant that speaks raw `SignalMessage`s.
pub struct RelayClient {
    pub identity: Identity,
    inbound: mpsc::UnboundedSender<SignalMessage>,
    outbound: mpsc::UnboundedReceiver<SignalMessage>,
}

impl RelayClient {
    pub fn attach(service: &RelayService, identity: Identity) -> Self {
        let RelayConnection { inbound, outbound } = service.attach();
        Self {
            identity,
            inbound,
            outbound,
        }
    }

    /// Attach and register, expecting `user-created`.
    pub async fn join(service: &RelayService, identity: Identity) -> Result<Self> {
        let mut client = Self::attach(service, identity);
        client.send(SignalMessage::CreateUser(client.identity.clone()))?;

        match client.recv().await? {
            SignalMessage::UserCreated => Ok(client),
            other => anyhow::bail!("expected user-created, got {:?}", other),
        }
    }

    pub fn send(&self, msg: SignalMessage) -> Result<()> {
        self.inbound.send(msg).context("relay connection closed")
    }

    pub async fn recv(&mut self) -> Result<SignalMessage> {
        tokio::time::timeout(
            Duration::from_millis(RELAY_TIMEOUT_MS),
            self.outbound.recv(),
        )
        .await
        .context("timed out waiting for relay message")?
        .context("relay connection closed")
    }

    /// Returns true when nothing arrives within `ms`.
    pub async fn is_quiet_for(&mut self, ms: u64) -> bool {
        tokio::time::timeout(Duration::from_millis(ms), self.outbound.recv())
            .await
            .is_err()
    }
}
