use crate::error::SendError;
use crate::media::SinkInfo;
use crate::viewer::ViewerStatus;
use lounge_core::{ChatMessage, Identity, TrackId};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum ViewerCommand {
    SendChat {
        body: String,
        reply: oneshot::Sender<Result<ChatMessage, SendError>>,
    },
    ToggleLocalMute {
        reply: oneshot::Sender<bool>,
    },
    ToggleRemote {
        track: TrackId,
        reply: oneshot::Sender<Option<bool>>,
    },
    SetVolume {
        track: TrackId,
        volume: f32,
        reply: oneshot::Sender<Option<f32>>,
    },
    ToggleAllRemote {
        reply: oneshot::Sender<bool>,
    },
    Roster {
        reply: oneshot::Sender<Vec<Identity>>,
    },
    Messages {
        reply: oneshot::Sender<Vec<ChatMessage>>,
    },
    Sinks {
        reply: oneshot::Sender<Vec<SinkInfo>>,
    },
    Status {
        reply: oneshot::Sender<ViewerStatus>,
    },
    Teardown {
        reply: oneshot::Sender<()>,
    },
}
