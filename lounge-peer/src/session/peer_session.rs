use crate::error::SendError;
use crate::media::{LocalTrack, RemoteTrack};
use crate::session::{ConnectionState, SessionConfig};
use crate::signaling::SignalingOutput;
use crate::transport::PeerTransport;
use anyhow::Result;
use lounge_core::{
    ChatMessage, IceCandidate, Identity, SdpKind, SessionDescription, TrackId, TrackKind,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Which side of the offer/answer exchange a session plays. The host
/// offers toward every viewer; the viewer only ever answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Offerer,
    Answerer,
}

/// One transport connection to a remote peer plus its negotiation state.
///
/// `viewer` is the routing key of the session on both ends: the remote
/// viewer on the host, the local participant on a viewer.
pub struct PeerSession {
    local: Identity,
    viewer: Identity,
    role: NegotiationRole,
    transport: Arc<dyn PeerTransport>,
    signaling: Arc<dyn SignalingOutput>,
    state: ConnectionState,
    state_since: Instant,
    local_tracks: BTreeMap<TrackId, LocalTrack>,
    remote_tracks: BTreeMap<TrackId, RemoteTrack>,
    making_offer: bool,
    offer_sent_at: Option<Instant>,
    pending_negotiation: bool,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
    channel_open: bool,
    closed: bool,
}

impl PeerSession {
    /// Attaches `tracks` before any negotiation, sets up the offerer's
    /// data channel and enters `Connecting`.
    pub async fn open(
        config: &SessionConfig,
        local: Identity,
        viewer: Identity,
        role: NegotiationRole,
        transport: Arc<dyn PeerTransport>,
        signaling: Arc<dyn SignalingOutput>,
        tracks: Vec<LocalTrack>,
    ) -> Result<Self> {
        let mut session = Self {
            local,
            viewer,
            role,
            transport,
            signaling,
            state: ConnectionState::New,
            state_since: Instant::now(),
            local_tracks: BTreeMap::new(),
            remote_tracks: BTreeMap::new(),
            making_offer: false,
            offer_sent_at: None,
            pending_negotiation: false,
            remote_description_set: false,
            pending_candidates: Vec::new(),
            channel_open: false,
            closed: false,
        };

        for track in tracks {
            session.transport.add_track(&track).await?;
            session.local_tracks.insert(track.id().clone(), track);
        }

        if role == NegotiationRole::Offerer {
            let sends_audio = session
                .local_tracks
                .values()
                .any(|t| t.kind() == TrackKind::Audio);
            if !sends_audio {
                session.transport.receive_only(TrackKind::Audio).await?;
            }
            session
                .transport
                .create_data_channel(&config.data_channel_label)
                .await?;
        }

        session.set_state(ConnectionState::Connecting);
        Ok(session)
    }

    pub fn viewer(&self) -> &Identity {
        &self.viewer
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_negotiating(&self) -> bool {
        self.making_offer
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel_open
    }

    pub fn has_local_track(&self, id: &TrackId) -> bool {
        self.local_tracks.contains_key(id)
    }

    pub fn local_track_ids(&self) -> Vec<TrackId> {
        self.local_tracks.keys().cloned().collect()
    }

    pub fn remote_tracks(&self) -> impl Iterator<Item = &RemoteTrack> {
        self.remote_tracks.values()
    }

    pub fn pending_candidate_count(&self) -> usize {
        self.pending_candidates.len()
    }

    fn set_state(&mut self, state: ConnectionState) {
        info!(
            "Session {} state {} -> {}",
            self.viewer, self.state, state
        );
        self.state = state;
        self.state_since = Instant::now();
    }

    /// Starts an offer, or marks one as pending if an exchange is already
    /// in flight. Answerers never offer.
    pub async fn negotiate(&mut self) -> Result<()> {
        if self.role == NegotiationRole::Answerer || self.closed || self.state.is_terminal() {
            return Ok(());
        }
        if self.making_offer {
            debug!("Offer in flight for {}; coalescing", self.viewer);
            self.pending_negotiation = true;
            return Ok(());
        }

        self.making_offer = true;
        self.pending_negotiation = false;

        let offer = match self.transport.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                self.making_offer = false;
                return Err(e);
            }
        };
        self.offer_sent_at = Some(Instant::now());
        debug!("Sending offer to {}", self.viewer);
        self.signaling.send_description(&self.viewer, offer).await;
        Ok(())
    }

    pub async fn apply_description(&mut self, description: SessionDescription) -> Result<()> {
        match (self.role, description.kind) {
            (NegotiationRole::Answerer, SdpKind::Offer) => {
                self.transport.set_remote_description(description).await?;
                self.remote_description_set = true;
                self.flush_candidates().await;

                let answer = self.transport.create_answer().await?;
                debug!("Sending answer for {}", self.viewer);
                self.signaling.send_description(&self.viewer, answer).await;
            }

            (NegotiationRole::Offerer, SdpKind::Answer) => {
                if !self.making_offer {
                    warn!("Dropping unsolicited answer from {}", self.viewer);
                    return Ok(());
                }

                let applied = self.transport.set_remote_description(description).await;
                self.making_offer = false;
                self.offer_sent_at = None;
                applied?;
                self.remote_description_set = true;
                self.flush_candidates().await;

                if self.pending_negotiation {
                    self.negotiate().await?;
                }
            }

            (NegotiationRole::Offerer, SdpKind::Offer) => {
                warn!("Ignoring colliding offer from {}", self.viewer);
            }

            (NegotiationRole::Answerer, SdpKind::Answer) => {
                warn!("Answerer received an answer for {}; dropping", self.viewer);
            }
        }
        Ok(())
    }

    /// Applies a remote candidate, buffering it until a remote description
    /// exists.
    pub async fn add_remote_candidate(&mut self, candidate: IceCandidate) -> Result<()> {
        if !self.remote_description_set {
            debug!("Buffering early candidate for {}", self.viewer);
            self.pending_candidates.push(candidate);
            return Ok(());
        }
        self.transport.add_ice_candidate(candidate).await
    }

    async fn flush_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!("Failed to apply buffered candidate for {}: {:?}", self.viewer, e);
            }
        }
    }

    pub async fn send_local_candidate(&self, candidate: IceCandidate) {
        self.signaling.send_ice(&self.viewer, candidate).await;
    }

    /// Returns false if the track was already attached. The transport
    /// reports the resulting negotiation-needed on its event stream.
    pub async fn attach_track(&mut self, track: LocalTrack) -> Result<bool> {
        if self.local_tracks.contains_key(track.id()) {
            return Ok(false);
        }
        self.transport.add_track(&track).await?;
        self.local_tracks.insert(track.id().clone(), track);
        Ok(true)
    }

    /// Detaches the attached subset of `ids` and announces the removal
    /// with one `TrackChange` message. Returns the ids actually removed.
    pub async fn detach_tracks(&mut self, ids: &[TrackId]) -> Vec<TrackId> {
        let mut removed = Vec::new();
        for id in ids {
            if self.local_tracks.remove(id).is_none() {
                continue;
            }
            if let Err(e) = self.transport.remove_track(id).await {
                warn!("Failed to remove track {} from {}: {:?}", id, self.viewer, e);
            }
            removed.push(id.clone());
        }

        if !removed.is_empty() {
            let notice = ChatMessage::track_removed(self.local.clone(), removed.clone());
            if let Err(e) = self.send_message(&notice).await {
                debug!("Track removal notice to {} lost: {}", self.viewer, e);
            }
        }
        removed
    }

    pub async fn send_message(&self, message: &ChatMessage) -> Result<(), SendError> {
        let text = message
            .encode()
            .map_err(|e| SendError::Failed(e.to_string()))?;
        self.transport.send_text(text).await
    }

    pub fn mark_channel_open(&mut self) {
        self.channel_open = true;
    }

    /// Returns false if a track with this id is already known.
    pub fn track_arrived(&mut self, track: RemoteTrack) -> bool {
        if self.remote_tracks.contains_key(track.id()) {
            return false;
        }
        self.remote_tracks.insert(track.id().clone(), track);
        true
    }

    pub fn track_ended(&mut self, id: &TrackId) -> Option<RemoteTrack> {
        self.remote_tracks.remove(id)
    }

    /// Applies a transport state report, returning the new state when it
    /// is an actual transition.
    pub fn on_state(&mut self, reported: ConnectionState) -> Option<ConnectionState> {
        let next = self.state.advance(reported)?;
        self.set_state(next);
        Some(next)
    }

    pub fn is_stalled(&self, now: Instant, timeout: Duration) -> bool {
        self.state == ConnectionState::Connecting
            && now.saturating_duration_since(self.state_since) >= timeout
    }

    /// An offer on a connected session that has gone unanswered for
    /// `timeout`. Until it is answered every renegotiation is coalesced.
    pub fn is_offer_stalled(&self, now: Instant, timeout: Duration) -> bool {
        self.state == ConnectionState::Connected
            && self
                .offer_sent_at
                .is_some_and(|sent| now.saturating_duration_since(sent) >= timeout)
    }

    /// Gives up on the outstanding offer and sends a fresh one, which also
    /// carries any changes coalesced behind it.
    pub async fn restart_offer(&mut self) -> Result<()> {
        if !self.making_offer {
            return Ok(());
        }
        warn!("Offer to {} went unanswered; offering again", self.viewer);
        self.making_offer = false;
        self.offer_sent_at = None;
        self.negotiate().await
    }

    pub fn fail(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.set_state(ConnectionState::Failed);
        true
    }

    /// Releases the transport. Local tracks are shared and stay alive.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if !self.state.is_terminal() {
            self.set_state(ConnectionState::Disconnected);
        }
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport for {}: {:?}", self.viewer, e);
        }
    }
}
