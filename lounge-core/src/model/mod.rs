mod chat;
mod ice;
mod identity;
mod media;
mod signaling;

pub use chat::{ChatBody, ChatMessage, CodecError};
pub use ice::{IceCandidate, IceServerConfig};
pub use identity::{Identity, ParticipantId, Role};
pub use media::{TrackAction, TrackId, TrackKind};
pub use signaling::{SdpKind, SessionDescription, SignalMessage};
