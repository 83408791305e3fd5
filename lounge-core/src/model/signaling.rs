use crate::model::ice::IceCandidate;
use crate::model::identity::Identity;
use crate::model::media::{TrackAction, TrackId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Events exchanged with the signaling relay.
///
/// Peer-addressed variants carry `identity`: the viewer whose host/viewer
/// session the message belongs to. One relay connection multiplexes many
/// sessions, so both ends dispatch on `identity.id`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    CreateUser(Identity),
    CreateConnection(Identity),
    UserCreated,
    Sdp {
        identity: Identity,
        description: SessionDescription,
    },
    Ice {
        identity: Identity,
        candidate: IceCandidate,
    },
    NoHost {
        identity: Identity,
    },
    HostAlreadyExists {
        existing_host: Identity,
    },
    TrackChange {
        identity: Identity,
        action: TrackAction,
        track_ids: Vec<TrackId>,
    },
}

impl SignalMessage {
    /// The session this message is addressed to, if it is peer-addressed.
    pub fn session(&self) -> Option<&Identity> {
        match self {
            SignalMessage::Sdp { identity, .. }
            | SignalMessage::Ice { identity, .. }
            | SignalMessage::NoHost { identity }
            | SignalMessage::TrackChange { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            SignalMessage::CreateUser(_) => "create-user",
            SignalMessage::CreateConnection(_) => "create-connection",
            SignalMessage::UserCreated => "user-created",
            SignalMessage::Sdp { .. } => "sdp",
            SignalMessage::Ice { .. } => "ice",
            SignalMessage::NoHost { .. } => "no-host",
            SignalMessage::HostAlreadyExists { .. } => "host-already-exists",
            SignalMessage::TrackChange { .. } => "track-change",
        }
    }
}
