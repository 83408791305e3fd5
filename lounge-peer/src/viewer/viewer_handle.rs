use crate::error::{SendError, SessionError};
use crate::media::SinkInfo;
use crate::viewer::{ViewerCommand, ViewerStatus};
use lounge_core::{ChatMessage, Identity, TrackId};
use tokio::sync::{mpsc, oneshot};

#[derive(Clone)]
pub struct ViewerHandle {
    identity: Identity,
    commands: mpsc::Sender<ViewerCommand>,
}

impl ViewerHandle {
    pub(crate) fn new(identity: Identity, commands: mpsc::Sender<ViewerCommand>) -> Self {
        Self { identity, commands }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ViewerCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Stopped)?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    /// Sends a chat line to the host. The outer error means the client has
    /// stopped; the inner one is the data channel outcome. The line is
    /// added to the local history only when the send succeeds.
    pub async fn send_chat(
        &self,
        body: impl Into<String>,
    ) -> Result<Result<ChatMessage, SendError>, SessionError> {
        let body = body.into();
        self.request(|reply| ViewerCommand::SendChat { body, reply })
            .await
    }

    pub async fn toggle_local_mute(&self) -> Result<bool, SessionError> {
        self.request(|reply| ViewerCommand::ToggleLocalMute { reply })
            .await
    }

    pub async fn toggle_remote(&self, track: TrackId) -> Result<Option<bool>, SessionError> {
        self.request(|reply| ViewerCommand::ToggleRemote { track, reply })
            .await
    }

    pub async fn set_volume(&self, track: TrackId, volume: f32) -> Result<Option<f32>, SessionError> {
        self.request(|reply| ViewerCommand::SetVolume {
            track,
            volume,
            reply,
        })
        .await
    }

    pub async fn toggle_all_remote(&self) -> Result<bool, SessionError> {
        self.request(|reply| ViewerCommand::ToggleAllRemote { reply })
            .await
    }

    pub async fn roster(&self) -> Result<Vec<Identity>, SessionError> {
        self.request(|reply| ViewerCommand::Roster { reply }).await
    }

    pub async fn messages(&self) -> Result<Vec<ChatMessage>, SessionError> {
        self.request(|reply| ViewerCommand::Messages { reply }).await
    }

    pub async fn sinks(&self) -> Result<Vec<SinkInfo>, SessionError> {
        self.request(|reply| ViewerCommand::Sinks { reply }).await
    }

    pub async fn status(&self) -> Result<ViewerStatus, SessionError> {
        self.request(|reply| ViewerCommand::Status { reply }).await
    }

    pub async fn teardown(&self) -> Result<(), SessionError> {
        self.request(|reply| ViewerCommand::Teardown { reply })
            .await
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}
