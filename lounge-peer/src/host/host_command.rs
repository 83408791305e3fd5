use crate::host::{MediaOpts, ViewerInfo};
use crate::media::LocalTrack;
use lounge_core::{ChatMessage, ParticipantId};
use tokio::sync::oneshot;

/// Requests from a `HostHandle` to the host actor.
#[derive(Debug)]
pub enum HostCommand {
    SendChat {
        body: String,
        reply: oneshot::Sender<ChatMessage>,
    },
    ShareScreen {
        tracks: Vec<LocalTrack>,
        reply: oneshot::Sender<()>,
    },
    StopScreenShare {
        reply: oneshot::Sender<()>,
    },
    /// Replies with the new muted state.
    ToggleLocalMute {
        reply: oneshot::Sender<bool>,
    },
    /// Replies with the viewer's new muted state, `None` for an unknown viewer.
    ToggleRemote {
        viewer: ParticipantId,
        reply: oneshot::Sender<Option<bool>>,
    },
    ToggleAllRemote {
        reply: oneshot::Sender<bool>,
    },
    Viewers {
        reply: oneshot::Sender<Vec<ViewerInfo>>,
    },
    Messages {
        reply: oneshot::Sender<Vec<ChatMessage>>,
    },
    MediaOpts {
        reply: oneshot::Sender<MediaOpts>,
    },
    RelayOperations {
        reply: oneshot::Sender<u64>,
    },
    Teardown {
        reply: oneshot::Sender<()>,
    },
}
