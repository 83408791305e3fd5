use anyhow::Result;
use lounge_core::{ParticipantId, TrackId, TrackKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp::packet::Packet;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocalWriter;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    Microphone,
    Screen,
    /// A viewer's inbound track mirrored by the host for the other viewers.
    Relay(ParticipantId),
}

/// An outbound track. Clones share the same RTP sink and `enabled` flag,
/// so muting through one clone mutes every session carrying it.
#[derive(Clone)]
pub struct LocalTrack {
    id: TrackId,
    kind: TrackKind,
    source: TrackSource,
    rtp: Arc<TrackLocalStaticRTP>,
    enabled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

pub(crate) fn default_codec(kind: TrackKind) -> RTCRtpCodecCapability {
    match kind {
        TrackKind::Audio => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        },
        TrackKind::Video => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            ..Default::default()
        },
    }
}

impl LocalTrack {
    pub fn new(
        id: impl Into<TrackId>,
        kind: TrackKind,
        source: TrackSource,
        stream_id: impl Into<String>,
    ) -> Self {
        Self::with_codec(id, kind, source, stream_id, default_codec(kind))
    }

    pub fn with_codec(
        id: impl Into<TrackId>,
        kind: TrackKind,
        source: TrackSource,
        stream_id: impl Into<String>,
        codec: RTCRtpCodecCapability,
    ) -> Self {
        let id = id.into();
        let rtp = TrackLocalStaticRTP::new(codec, id.as_str().to_owned(), stream_id.into());

        Self {
            id,
            kind,
            source,
            rtp: Arc::new(rtp),
            enabled: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn microphone(owner: ParticipantId) -> Self {
        Self::new(
            format!("mic-{owner}"),
            TrackKind::Audio,
            TrackSource::Microphone,
            owner.to_string(),
        )
    }

    pub fn screen(owner: ParticipantId, kind: TrackKind) -> Self {
        let suffix = match kind {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        };
        Self::new(
            format!("screen-{suffix}-{owner}"),
            kind,
            TrackSource::Screen,
            format!("screen-{owner}"),
        )
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn source(&self) -> TrackSource {
        self.source
    }

    pub fn rtp(&self) -> Arc<TrackLocalStaticRTP> {
        self.rtp.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flips `enabled` and returns the new value.
    pub fn toggle_enabled(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Writes one packet to every bound session. Disabled or stopped
    /// tracks swallow the packet and report zero bytes.
    pub async fn write_rtp(&self, packet: &Packet) -> Result<usize> {
        if !self.is_enabled() || self.is_stopped() {
            return Ok(0);
        }
        Ok(self.rtp.write_rtp(packet).await?)
    }
}

impl std::fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
