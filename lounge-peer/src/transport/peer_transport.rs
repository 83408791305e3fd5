use crate::error::SendError;
use crate::media::LocalTrack;
use crate::transport::{SessionKey, TransportConfig, TransportEvent};
use anyhow::Result;
use async_trait::async_trait;
use lounge_core::{IceCandidate, SessionDescription, TrackId, TrackKind};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One real-time connection to a remote peer.
///
/// Implementations report everything asynchronous (state, candidates,
/// tracks, data channel traffic) as `TransportEvent`s on the channel they
/// were created with.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> Result<()>;

    async fn remove_track(&self, track_id: &TrackId) -> Result<()>;

    /// Adds a receive-only media slot so the remote side can send `kind`
    /// without the local side sending anything.
    async fn receive_only(&self, kind: TrackKind) -> Result<()>;

    /// Creates an offer and applies it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Creates an answer and applies it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Creates the ordered, reliable application channel.
    async fn create_data_channel(&self, label: &str) -> Result<()>;

    async fn send_text(&self, text: String) -> Result<(), SendError>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Every event the transport reports carries `session`.
    async fn create(
        &self,
        session: SessionKey,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>>;
}
