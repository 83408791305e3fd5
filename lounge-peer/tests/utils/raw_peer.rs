use anyhow::{Context, Result};
use lounge_core::{Identity, SessionDescription, SignalMessage};
use lounge_relay::{RelayConnection, RelayService};
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single relay round trip (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 3000;

/// The remote side of a session, played by the test directly on the relay.
pub struct RawPeer {
    pub identity: Identity,
    inbound: mpsc::UnboundedSender<SignalMessage>,
    outbound: mpsc::UnboundedReceiver<SignalMessage>,
}

impl RawPeer {
    /// Attach and register, expecting `user-created`.
    pub async fn join(service: &RelayService, identity: Identity) -> Result<Self> {
        let RelayConnection { inbound, outbound } = service.attach();
        let mut peer = Self {
            identity,
            inbound,
            outbound,
        };
        peer.send(SignalMessage::CreateUser(peer.identity.clone()))?;

        match peer.recv().await? {
            SignalMessage::UserCreated => Ok(peer),
            other => anyhow::bail!("expected user-created, got {:?}", other),
        }
    }

    pub fn send(&self, msg: SignalMessage) -> Result<()> {
        self.inbound.send(msg).context("relay connection closed")
    }

    pub async fn recv(&mut self) -> Result<SignalMessage> {
        tokio::time::timeout(
            Duration::from_millis(SIGNAL_TIMEOUT_MS),
            self.outbound.recv(),
        )
        .await
        .context("timed out waiting for relay message")?
        .context("relay connection closed")
    }

    /// Skips messages until `pick` returns a value.
    pub async fn recv_map<T>(&mut self, mut pick: impl FnMut(SignalMessage) -> Option<T>) -> Result<T> {
        loop {
            if let Some(value) = pick(self.recv().await?) {
                return Ok(value);
            }
        }
    }

    pub async fn expect_offer(&mut self) -> Result<(Identity, SessionDescription)> {
        self.recv_map(|msg| match msg {
            SignalMessage::Sdp {
                identity,
                description,
            } if description.kind == lounge_core::SdpKind::Offer => Some((identity, description)),
            _ => None,
        })
        .await
    }

    /// Requests a session from the host as a viewer.
    pub fn request_session(&self) -> Result<()> {
        self.send(SignalMessage::CreateConnection(self.identity.clone()))
    }

    /// Answers the host on behalf of this viewer's session.
    pub fn answer(&self) -> Result<()> {
        self.send(SignalMessage::Sdp {
            identity: self.identity.clone(),
            description: SessionDescription::answer("answer"),
        })
    }

    /// Collects everything that arrives within `ms`.
    pub async fn drain_for(&mut self, ms: u64) -> Vec<SignalMessage> {
        let mut received = Vec::new();
        let deadline = tokio::time::Instant::now() + Duration::from_millis(ms);
        while let Ok(Some(msg)) = tokio::time::timeout_at(deadline, self.outbound.recv()).await {
            received.push(msg);
        }
        received
    }
}
