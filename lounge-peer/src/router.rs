//! Data channel dispatch shared by host and viewer.

use lounge_core::{ChatMessage, CodecError, ParticipantId};
use tracing::warn;

/// Decodes one data channel payload. Malformed and unknown messages are
/// logged and dropped.
pub fn decode(session: ParticipantId, raw: &[u8]) -> Option<ChatMessage> {
    match ChatMessage::decode(raw) {
        Ok(message) => Some(message),
        Err(CodecError::UnknownKind(kind)) => {
            warn!("Dropping unknown message kind '{}' on {}", kind, session);
            None
        }
        Err(e) => {
            warn!("Dropping malformed message on {}: {}", session, e);
            None
        }
    }
}
