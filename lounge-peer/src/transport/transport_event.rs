use crate::media::RemoteTrack;
use crate::session::ConnectionState;
use bytes::Bytes;
use lounge_core::{IceCandidate, ParticipantId, TrackId};
use std::fmt;

/// Names one transport: the viewer it serves and which of that viewer's
/// sessions created it. A viewer that reconnects gets a new epoch, so
/// late callbacks from its previous transport can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub viewer: ParticipantId,
    pub epoch: u64,
}

impl SessionKey {
    pub fn new(viewer: ParticipantId, epoch: u64) -> Self {
        Self { viewer, epoch }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.viewer, self.epoch)
    }
}

/// Transport callbacks, flattened into one stream per owner and keyed by
/// the session that produced them.
#[derive(Debug)]
pub enum TransportEvent {
    StateChanged(SessionKey, ConnectionState),
    CandidateGenerated(SessionKey, IceCandidate),
    NegotiationNeeded(SessionKey),
    TrackArrived(SessionKey, RemoteTrack),
    TrackEnded(SessionKey, TrackId),
    DataChannelReady(SessionKey),
    Message(SessionKey, Bytes),
}

impl TransportEvent {
    pub fn session(&self) -> SessionKey {
        match self {
            TransportEvent::StateChanged(key, _)
            | TransportEvent::CandidateGenerated(key, _)
            | TransportEvent::NegotiationNeeded(key)
            | TransportEvent::TrackArrived(key, _)
            | TransportEvent::TrackEnded(key, _)
            | TransportEvent::DataChannelReady(key)
            | TransportEvent::Message(key, _) => *key,
        }
    }
}
