//! The connect sequence shared by host and viewer: acquire media, announce,
//! wait for the relay to acknowledge.

use crate::error::ConnectError;
use crate::media::{LocalTrack, MediaSource};
use crate::session::SessionConfig;
use crate::signaling::{RelayEvent, RelayEvents, SignalingClient};
use lounge_core::Identity;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn release(tracks: &[LocalTrack]) {
    for track in tracks {
        track.stop();
    }
}

pub(crate) async fn acquire_and_register(
    config: &SessionConfig,
    identity: &Identity,
    signaling: &SignalingClient,
    media: &dyn MediaSource,
    cancel: &CancellationToken,
) -> Result<(Vec<LocalTrack>, RelayEvents), ConnectError> {
    let tracks = tokio::select! {
        _ = cancel.cancelled() => return Err(ConnectError::Cancelled),
        acquired = media.acquire_microphone(identity) => {
            acquired.map_err(|e| ConnectError::MediaUnavailable(e.to_string()))?
        }
    };

    let registered = tokio::select! {
        _ = cancel.cancelled() => Err(ConnectError::Cancelled),
        res = tokio::time::timeout(config.connect_timeout, register(identity, signaling)) => {
            res.unwrap_or(Err(ConnectError::Timeout))
        }
    };

    match registered {
        Ok(events) => {
            info!("{} registered with relay", identity);
            Ok((tracks, events))
        }
        Err(e) => {
            warn!("Connect aborted for {}: {}", identity, e);
            release(&tracks);
            Err(e)
        }
    }
}

async fn register(identity: &Identity, signaling: &SignalingClient) -> Result<RelayEvents, ConnectError> {
    let mut events = signaling.announce(identity).await?;

    loop {
        match events.recv().await {
            Some(RelayEvent::Registered) => return Ok(events),
            Some(RelayEvent::HostAlreadyExists(existing)) => {
                return Err(ConnectError::HostAlreadyExists(existing));
            }
            Some(RelayEvent::CreateConnectionRequest(viewer)) => {
                warn!("Connection request from {} before registration", viewer);
            }
            Some(RelayEvent::Closed) | None => {
                return Err(crate::error::SignalingError::Closed.into());
            }
        }
    }
}
