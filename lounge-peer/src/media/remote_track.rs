use crate::media::local_track::{LocalTrack, TrackSource, default_codec};
use anyhow::Result;
use lounge_core::{ParticipantId, TrackId, TrackKind};
use tokio::sync::broadcast;
use tracing::warn;
use webrtc::rtp::packet::Packet;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;

const PACKET_BUFFER: usize = 256;

/// An inbound track as delivered by a session.
///
/// Every packet read from the transport is written to `mirror` (a local
/// track with the same id that the host can attach to other sessions) and
/// published to render subscribers.
#[derive(Clone)]
pub struct RemoteTrack {
    id: TrackId,
    kind: TrackKind,
    stream_id: String,
    mirror: LocalTrack,
    packets: broadcast::Sender<Packet>,
}

impl RemoteTrack {
    pub fn new(
        origin: ParticipantId,
        id: impl Into<TrackId>,
        kind: TrackKind,
        stream_id: impl Into<String>,
    ) -> Self {
        Self::with_codec(origin, id, kind, stream_id, default_codec(kind))
    }

    pub fn with_codec(
        origin: ParticipantId,
        id: impl Into<TrackId>,
        kind: TrackKind,
        stream_id: impl Into<String>,
        codec: RTCRtpCodecCapability,
    ) -> Self {
        let id = id.into();
        let stream_id = stream_id.into();
        let mirror = LocalTrack::with_codec(
            id.clone(),
            kind,
            TrackSource::Relay(origin),
            stream_id.clone(),
            codec,
        );
        let (packets, _) = broadcast::channel(PACKET_BUFFER);

        Self {
            id,
            kind,
            stream_id,
            mirror,
            packets,
        }
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn mirror(&self) -> &LocalTrack {
        &self.mirror
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Packet> {
        self.packets.subscribe()
    }

    pub async fn forward(&self, packet: Packet) -> Result<()> {
        if let Err(e) = self.mirror.write_rtp(&packet).await {
            warn!("Relay write failed for track {}: {}", self.id, e);
        }
        // No subscribers is fine.
        let _ = self.packets.send(packet);
        Ok(())
    }
}

impl std::fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("stream_id", &self.stream_id)
            .finish()
    }
}
