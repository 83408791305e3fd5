use lounge_core::Identity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("failed to reach relay: {0}")]
    Connect(String),
    #[error("relay connection closed")]
    Closed,
    #[error("identity already announced on this client")]
    AlreadyAnnounced,
}

/// Outcome of a best-effort data channel send. Returned, never raised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("data channel was never created")]
    NoChannel,
    #[error("data channel is not open yet")]
    NotOpen,
    #[error("data channel send failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("local media unavailable: {0}")]
    MediaUnavailable(String),
    #[error("connect cancelled")]
    Cancelled,
    #[error("relay registration timed out")]
    Timeout,
    #[error("{0} is already hosting")]
    HostAlreadyExists(Identity),
    #[error(transparent)]
    Signaling(#[from] SignalingError),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("session actor has stopped")]
    Stopped,
}
