use crate::error::SessionError;
use crate::host::{HostCommand, MediaOpts, ViewerInfo};
use crate::media::LocalTrack;
use lounge_core::{ChatMessage, Identity, ParticipantId};
use tokio::sync::{mpsc, oneshot};

/// Cheap, cloneable control surface of a running host.
#[derive(Clone)]
pub struct HostHandle {
    identity: Identity,
    commands: mpsc::Sender<HostCommand>,
}

impl HostHandle {
    pub(crate) fn new(identity: Identity, commands: mpsc::Sender<HostCommand>) -> Self {
        Self { identity, commands }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> HostCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Stopped)?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    /// Broadcasts a chat line to every viewer and returns it.
    pub async fn send_chat(&self, body: impl Into<String>) -> Result<ChatMessage, SessionError> {
        let body = body.into();
        self.request(|reply| HostCommand::SendChat { body, reply })
            .await
    }

    pub async fn share_screen(&self, tracks: Vec<LocalTrack>) -> Result<(), SessionError> {
        self.request(|reply| HostCommand::ShareScreen { tracks, reply })
            .await
    }

    pub async fn stop_screen_share(&self) -> Result<(), SessionError> {
        self.request(|reply| HostCommand::StopScreenShare { reply })
            .await
    }

    pub async fn toggle_local_mute(&self) -> Result<bool, SessionError> {
        self.request(|reply| HostCommand::ToggleLocalMute { reply })
            .await
    }

    pub async fn toggle_remote(&self, viewer: ParticipantId) -> Result<Option<bool>, SessionError> {
        self.request(|reply| HostCommand::ToggleRemote { viewer, reply })
            .await
    }

    pub async fn toggle_all_remote(&self) -> Result<bool, SessionError> {
        self.request(|reply| HostCommand::ToggleAllRemote { reply })
            .await
    }

    pub async fn viewers(&self) -> Result<Vec<ViewerInfo>, SessionError> {
        self.request(|reply| HostCommand::Viewers { reply }).await
    }

    pub async fn messages(&self) -> Result<Vec<ChatMessage>, SessionError> {
        self.request(|reply| HostCommand::Messages { reply }).await
    }

    pub async fn media_opts(&self) -> Result<MediaOpts, SessionError> {
        self.request(|reply| HostCommand::MediaOpts { reply }).await
    }

    /// Number of times a track has been attached to a session other than
    /// the one it originates from.
    pub async fn relay_operations(&self) -> Result<u64, SessionError> {
        self.request(|reply| HostCommand::RelayOperations { reply })
            .await
    }

    /// Closes every session and releases local media. The actor stops.
    pub async fn teardown(&self) -> Result<(), SessionError> {
        self.request(|reply| HostCommand::Teardown { reply }).await
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}
