use crate::media::SinkInfo;
use crate::session::ConnectionState;
use crate::viewer::ViewerStatus;
use async_trait::async_trait;
use lounge_core::{ChatMessage, Identity, TrackId};

/// Hooks for the rendering layer. Every method defaults to a no-op.
///
/// On the host `viewer` is the remote viewer a session belongs to; on a
/// viewer it is the viewer itself (its only session is to the host).
#[async_trait]
pub trait ParticipantBehavior: Send + Sync {
    async fn on_status(&self, _status: ViewerStatus) {}

    async fn on_peer_state(&self, _viewer: &Identity, _state: ConnectionState) {}

    async fn on_chat(&self, _message: &ChatMessage) {}

    async fn on_roster(&self, _roster: &[Identity]) {}

    async fn on_track_added(&self, _viewer: &Identity, _sink: &SinkInfo) {}

    async fn on_track_removed(&self, _viewer: &Identity, _track_id: &TrackId) {}
}

/// A behavior that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBehavior;

impl ParticipantBehavior for NoopBehavior {}
