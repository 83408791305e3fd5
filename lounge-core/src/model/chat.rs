use crate::model::identity::Identity;
use crate::model::media::{TrackAction, TrackId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message kind '{0}'")]
    UnknownKind(String),
    #[error("invalid '{kind}' payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatBody {
    Text {
        body: String,
    },
    UserConnected {
        roster: Vec<Identity>,
    },
    UserDisconnected,
    TrackChange {
        action: TrackAction,
        track_ids: Vec<TrackId>,
    },
}

impl ChatBody {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatBody::Text { .. } => "text",
            ChatBody::UserConnected { .. } => "user-connected",
            ChatBody::UserDisconnected => "user-disconnected",
            ChatBody::TrackChange { .. } => "track-change",
        }
    }
}

/// Application message carried over a session's data channel.
///
/// Wire form: `{"type": ..., "sender": Identity, "data": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Identity,
    pub body: ChatBody,
}

#[derive(Serialize, Deserialize)]
struct Wire {
    #[serde(rename = "type")]
    kind: String,
    sender: Identity,
    #[serde(default)]
    data: Value,
}

#[derive(Serialize, Deserialize)]
struct TextData {
    body: String,
}

#[derive(Serialize, Deserialize)]
struct RosterData {
    roster: Vec<Identity>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackChangeData {
    action: TrackAction,
    track_ids: Vec<TrackId>,
}

fn payload<T: for<'de> Deserialize<'de>>(kind: &'static str, data: Value) -> Result<T, CodecError> {
    serde_json::from_value(data).map_err(|source| CodecError::InvalidPayload { kind, source })
}

impl ChatMessage {
    pub fn text(sender: Identity, body: impl Into<String>) -> Self {
        Self {
            sender,
            body: ChatBody::Text { body: body.into() },
        }
    }

    pub fn user_connected(sender: Identity, roster: Vec<Identity>) -> Self {
        Self {
            sender,
            body: ChatBody::UserConnected { roster },
        }
    }

    pub fn user_disconnected(sender: Identity) -> Self {
        Self {
            sender,
            body: ChatBody::UserDisconnected,
        }
    }

    pub fn track_removed(sender: Identity, track_ids: Vec<TrackId>) -> Self {
        Self {
            sender,
            body: ChatBody::TrackChange {
                action: TrackAction::Remove,
                track_ids,
            },
        }
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        let data = match &self.body {
            ChatBody::Text { body } => serde_json::to_value(TextData { body: body.clone() })?,
            ChatBody::UserConnected { roster } => serde_json::to_value(RosterData {
                roster: roster.clone(),
            })?,
            ChatBody::UserDisconnected => Value::Object(Default::default()),
            ChatBody::TrackChange { action, track_ids } => {
                serde_json::to_value(TrackChangeData {
                    action: *action,
                    track_ids: track_ids.clone(),
                })?
            }
        };

        let wire = Wire {
            kind: self.body.kind().to_owned(),
            sender: self.sender.clone(),
            data,
        };
        Ok(serde_json::to_string(&wire)?)
    }

    pub fn decode(raw: &[u8]) -> Result<Self, CodecError> {
        let wire: Wire = serde_json::from_slice(raw)?;

        let body = match wire.kind.as_str() {
            "text" => {
                let data: TextData = payload("text", wire.data)?;
                ChatBody::Text { body: data.body }
            }
            "user-connected" => {
                let data: RosterData = payload("user-connected", wire.data)?;
                ChatBody::UserConnected {
                    roster: data.roster,
                }
            }
            "user-disconnected" => ChatBody::UserDisconnected,
            "track-change" => {
                let data: TrackChangeData = payload("track-change", wire.data)?;
                ChatBody::TrackChange {
                    action: data.action,
                    track_ids: data.track_ids,
                }
            }
            _ => return Err(CodecError::UnknownKind(wire.kind)),
        };

        Ok(Self {
            sender: wire.sender,
            body,
        })
    }
}
