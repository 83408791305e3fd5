use async_trait::async_trait;
use lounge_core::{IceCandidate, Identity, SessionDescription};

/// Outbound half of signaling as seen by a session: everything it sends is
/// addressed by the session's viewer identity.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_description(&self, session: &Identity, description: SessionDescription);

    async fn send_ice(&self, session: &Identity, candidate: IceCandidate);
}
