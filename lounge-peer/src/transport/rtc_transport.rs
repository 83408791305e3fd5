use crate::error::SendError;
use crate::media::{LocalTrack, RemoteTrack};
use crate::session::ConnectionState;
use crate::transport::{
    PeerTransport, SessionKey, TransportConfig, TransportEvent, TransportFactory,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lounge_core::{IceCandidate, SdpKind, SessionDescription, TrackId, TrackKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

type DataChannelSlot = Arc<Mutex<Option<Arc<RTCDataChannel>>>>;

/// `PeerTransport` backed by a `webrtc` peer connection.
pub struct RtcTransport {
    session: SessionKey,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<HashMap<TrackId, Arc<RTCRtpSender>>>,
    data_channel: DataChannelSlot,
    events: mpsc::Sender<TransportEvent>,
}

fn connection_state(s: RTCPeerConnectionState) -> Option<ConnectionState> {
    match s {
        RTCPeerConnectionState::New => Some(ConnectionState::New),
        RTCPeerConnectionState::Connecting => Some(ConnectionState::Connecting),
        RTCPeerConnectionState::Connected => Some(ConnectionState::Connected),
        RTCPeerConnectionState::Disconnected | RTCPeerConnectionState::Closed => {
            Some(ConnectionState::Disconnected)
        }
        RTCPeerConnectionState::Failed => Some(ConnectionState::Failed),
        RTCPeerConnectionState::Unspecified => None,
    }
}

fn codec_type(kind: TrackKind) -> RTPCodecType {
    match kind {
        TrackKind::Audio => RTPCodecType::Audio,
        TrackKind::Video => RTPCodecType::Video,
    }
}

impl RtcTransport {
    /// Builds the peer connection and wires every callback into `events`.
    pub async fn new(
        session: SessionKey,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );
        let data_channel: DataChannelSlot = Arc::new(Mutex::new(None));

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state for session {}: {}", session, s);
                    if let Some(state) = connection_state(s) {
                        let _ = tx.send(TransportEvent::StateChanged(session, state)).await;
                    }
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Failed to serialize local candidate: {}", e);
                        return;
                    }
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(session, candidate))
                    .await;
            })
        }));

        let negotiation_tx = events.clone();
        peer_connection.on_negotiation_needed(Box::new(move || {
            let tx = negotiation_tx.clone();
            Box::pin(async move {
                let _ = tx.send(TransportEvent::NegotiationNeeded(session)).await;
            })
        }));

        let dc_tx = events.clone();
        let dc_slot = data_channel.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let slot = dc_slot.clone();
            Box::pin(async move {
                debug!("Inbound data channel '{}' for session {}", dc.label(), session);
                wire_data_channel(&dc, session, tx);
                *slot.lock().await = Some(dc);
            })
        }));

        let track_tx = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    relay_remote_track(session, track, tx).await;
                })
            },
        ));

        Ok(Self {
            session,
            peer_connection,
            senders: Mutex::new(HashMap::new()),
            data_channel,
            events,
        })
    }
}

fn wire_data_channel(dc: &Arc<RTCDataChannel>, session: SessionKey, tx: mpsc::Sender<TransportEvent>) {
    let open_tx = tx.clone();
    dc.on_open(Box::new(move || {
        let tx = open_tx.clone();
        Box::pin(async move {
            info!("Data channel open for session {}", session);
            let _ = tx.send(TransportEvent::DataChannelReady(session)).await;
        })
    }));

    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::Message(session, msg.data)).await;
        })
    }));
}

/// Announces the inbound track, then pumps its RTP into the relay mirror
/// until the transport stops delivering.
async fn relay_remote_track(
    session: SessionKey,
    track: Arc<TrackRemote>,
    tx: mpsc::Sender<TransportEvent>,
) {
    let kind = match track.kind() {
        RTPCodecType::Audio => TrackKind::Audio,
        RTPCodecType::Video => TrackKind::Video,
        RTPCodecType::Unspecified => {
            warn!("Ignoring track of unspecified kind on session {}", session);
            return;
        }
    };

    let remote = RemoteTrack::with_codec(
        session.viewer,
        track.id(),
        kind,
        track.stream_id(),
        track.codec().capability,
    );
    info!("Track {} ({:?}) arrived on session {}", remote.id(), kind, session);

    if tx
        .send(TransportEvent::TrackArrived(session, remote.clone()))
        .await
        .is_err()
    {
        return;
    }

    tokio::spawn(async move {
        loop {
            match track.read_rtp().await {
                Ok((packet, _)) => {
                    let _ = remote.forward(packet).await;
                }
                Err(e) => {
                    debug!("Track {} ended: {}", remote.id(), e);
                    break;
                }
            }
        }
        let _ = tx
            .send(TransportEvent::TrackEnded(session, remote.id().clone()))
            .await;
    });
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        let rtp_sender = self
            .peer_connection
            .add_track(track.rtp() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .with_context(|| format!("Failed to add track {}", track.id()))?;

        // RTCP has to be drained for the interceptors to run.
        let reader = rtp_sender.clone();
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while reader.read(&mut rtcp_buf).await.is_ok() {}
        });

        self.senders.lock().await.insert(track.id().clone(), rtp_sender);
        Ok(())
    }

    async fn remove_track(&self, track_id: &TrackId) -> Result<()> {
        let Some(rtp_sender) = self.senders.lock().await.remove(track_id) else {
            return Ok(());
        };
        self.peer_connection
            .remove_track(&rtp_sender)
            .await
            .with_context(|| format!("Failed to remove track {}", track_id))?;
        Ok(())
    }

    async fn receive_only(&self, kind: TrackKind) -> Result<()> {
        self.peer_connection
            .add_transceiver_from_kind(
                codec_type(kind),
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .context("Failed to add receive-only transceiver")?;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("Failed to apply local offer")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to apply local answer")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to apply remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn create_data_channel(&self, label: &str) -> Result<()> {
        let init = RTCDataChannelInit {
            ordered: Some(true),
            ..Default::default()
        };
        let dc = self
            .peer_connection
            .create_data_channel(label, Some(init))
            .await
            .context("Failed to create data channel")?;

        wire_data_channel(&dc, self.session, self.events.clone());
        *self.data_channel.lock().await = Some(dc);
        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<(), SendError> {
        let guard = self.data_channel.lock().await;
        let Some(dc) = guard.as_ref() else {
            return Err(SendError::NoChannel);
        };
        if dc.ready_state() != RTCDataChannelState::Open {
            return Err(SendError::NotOpen);
        }
        dc.send_text(text)
            .await
            .map(|_| ())
            .map_err(|e| SendError::Failed(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates `RtcTransport`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtcTransportFactory;

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        session: SessionKey,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        let transport = RtcTransport::new(session, config, events).await?;
        Ok(Arc::new(transport))
    }
}
