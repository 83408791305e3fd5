use crate::behavior::ParticipantBehavior;
use crate::connect::acquire_and_register;
use crate::error::{ConnectError, SendError};
use crate::media::{LocalTrack, MediaSource, SinkInfo, SinkRegistry};
use crate::router;
use crate::session::{ConnectionState, NegotiationRole, PeerSession, SessionConfig};
use crate::signaling::{RelayEvent, RelayEvents, SignalingClient, SignalingOutput};
use crate::transport::{SessionKey, TransportEvent, TransportFactory};
use crate::viewer::{ViewerCommand, ViewerHandle, ViewerStatus};
use bytes::Bytes;
use std::ops::ControlFlow;
use lounge_core::{ChatBody, ChatMessage, Identity, SignalMessage, TrackAction, TrackId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 64;
const TRANSPORT_BUFFER: usize = 256;

/// A viewer: one answering session to the host, many inbound tracks.
pub struct ViewerClient {
    config: SessionConfig,
    identity: Identity,
    signaling: SignalingClient,
    factory: Arc<dyn TransportFactory>,
    behavior: Arc<dyn ParticipantBehavior>,
}

impl ViewerClient {
    pub fn new(
        config: SessionConfig,
        identity: Identity,
        signaling: SignalingClient,
        factory: Arc<dyn TransportFactory>,
        behavior: Arc<dyn ParticipantBehavior>,
    ) -> Self {
        Self {
            config,
            identity,
            signaling,
            factory,
            behavior,
        }
    }

    /// Acquires the microphone, registers, opens the session to the host
    /// and asks the relay for a connection.
    pub async fn connect(
        self,
        media: &dyn MediaSource,
        cancel: CancellationToken,
    ) -> Result<ViewerHandle, ConnectError> {
        let (voice, relay_events) = acquire_and_register(
            &self.config,
            &self.identity,
            &self.signaling,
            media,
            &cancel,
        )
        .await?;

        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_BUFFER);
        let signaling_out: Arc<dyn SignalingOutput> = Arc::new(self.signaling.clone());

        let opened = match self
            .factory
            .create(
                SessionKey::new(self.identity.id, 0),
                &self.config.transport,
                transport_tx.clone(),
            )
            .await
        {
            Ok(transport) => {
                PeerSession::open(
                    &self.config,
                    self.identity.clone(),
                    self.identity.clone(),
                    NegotiationRole::Answerer,
                    transport,
                    signaling_out,
                    voice.clone(),
                )
                .await
            }
            Err(e) => Err(e),
        };
        let session = match opened {
            Ok(s) => s,
            Err(e) => {
                for track in &voice {
                    track.stop();
                }
                return Err(ConnectError::Transport(e));
            }
        };

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        self.signaling.register_handler(self.identity.id, signal_tx);
        self.signaling
            .send(SignalMessage::CreateConnection(self.identity.clone()));

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        self.behavior.on_status(ViewerStatus::Connecting).await;

        let actor = ViewerActor {
            config: self.config,
            identity: self.identity.clone(),
            signaling: self.signaling,
            behavior: self.behavior,
            session: Some(session),
            voice_tracks: voice,
            local_muted: false,
            roster: Vec::new(),
            messages: Vec::new(),
            sinks: SinkRegistry::new(),
            status: ViewerStatus::Connecting,
            relay_events: Some(relay_events),
            command_rx,
            transport_rx,
            _transport_tx: transport_tx,
            signal_rx,
        };
        tokio::spawn(actor.run());

        Ok(ViewerHandle::new(self.identity, command_tx))
    }
}

struct ViewerActor {
    config: SessionConfig,
    identity: Identity,
    signaling: SignalingClient,
    behavior: Arc<dyn ParticipantBehavior>,
    session: Option<PeerSession>,
    voice_tracks: Vec<LocalTrack>,
    local_muted: bool,
    roster: Vec<Identity>,
    messages: Vec<ChatMessage>,
    sinks: SinkRegistry,
    status: ViewerStatus,
    relay_events: Option<RelayEvents>,
    command_rx: mpsc::Receiver<ViewerCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    // Keeps `transport_rx` open after the session is gone.
    _transport_tx: mpsc::Sender<TransportEvent>,
    signal_rx: mpsc::UnboundedReceiver<SignalMessage>,
}

async fn next_relay_event(events: &mut Option<RelayEvents>) -> Option<RelayEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl ViewerActor {
    async fn run(mut self) {
        info!("Viewer {} event loop started", self.identity);

        let mut stall_check = tokio::time::interval(self.config.stall_check_interval);
        stall_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if self.handle_command(c).await.is_break() {
                                break;
                            }
                        }
                        None => {
                            self.teardown().await;
                            break;
                        }
                    }
                }

                Some(event) = self.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                }

                Some(msg) = self.signal_rx.recv() => {
                    self.handle_signal(msg).await;
                }

                event = next_relay_event(&mut self.relay_events) => {
                    match event {
                        Some(RelayEvent::Closed) | None => {
                            warn!("Relay connection lost");
                            self.relay_events = None;
                        }
                        Some(other) => debug!("Viewer ignoring relay event {:?}", other),
                    }
                }

                _ = stall_check.tick() => self.check_stalled().await,
            }
        }

        info!("Viewer {} event loop finished", self.identity);
    }

    async fn set_status(&mut self, status: ViewerStatus) {
        if self.status == status {
            return;
        }
        info!("Viewer {} status: {}", self.identity, status);
        self.status = status;
        self.behavior.on_status(status).await;
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::NoHost { .. } => {
                info!("No host available for {}", self.identity);
                self.end_session(ViewerStatus::NoHost).await;
            }

            SignalMessage::TrackChange {
                action: TrackAction::Remove,
                track_ids,
                ..
            } => self.retire_sinks(&track_ids).await,

            SignalMessage::Sdp { description, .. } => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if let Err(e) = session.apply_description(description).await {
                    warn!("Failed to apply host description: {:?}", e);
                }
            }

            SignalMessage::Ice { candidate, .. } => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if let Err(e) = session.add_remote_candidate(candidate).await {
                    warn!("Failed to add host candidate: {:?}", e);
                }
            }

            other => debug!("Viewer ignoring '{}'", other.event_name()),
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let Some(session) = self.session.as_mut() else {
            debug!("Dropping transport event after session end");
            return;
        };

        match event {
            TransportEvent::StateChanged(_, state) => {
                let Some(next) = session.on_state(state) else {
                    return;
                };
                self.behavior.on_peer_state(&self.identity, next).await;
                match next {
                    ConnectionState::Connected => self.set_status(ViewerStatus::Connected).await,
                    s if s.is_terminal() => self.end_session(ViewerStatus::Disconnected).await,
                    _ => {}
                }
            }

            TransportEvent::CandidateGenerated(_, candidate) => {
                session.send_local_candidate(candidate).await;
            }

            TransportEvent::NegotiationNeeded(_) => {
                if let Err(e) = session.negotiate().await {
                    warn!("Negotiation failed: {:?}", e);
                }
            }

            TransportEvent::TrackArrived(_, track) => {
                if !session.track_arrived(track.clone()) {
                    return;
                }
                let sink = SinkInfo::new(track.id().clone(), track.kind(), track.stream_id());
                if !self.sinks.insert(sink) {
                    return;
                }
                if let Some(sink) = self.sinks.get(track.id()).cloned() {
                    self.behavior.on_track_added(&self.identity, &sink).await;
                }
            }

            TransportEvent::TrackEnded(_, track_id) => {
                session.track_ended(&track_id);
                self.retire_sinks(std::slice::from_ref(&track_id)).await;
            }

            TransportEvent::DataChannelReady(_) => {
                info!("Data channel to host is open");
                session.mark_channel_open();
            }

            TransportEvent::Message(_, data) => self.on_host_message(data).await,
        }
    }

    async fn on_host_message(&mut self, data: Bytes) {
        let Some(message) = router::decode(self.identity.id, &data) else {
            return;
        };

        match &message.body {
            ChatBody::Text { .. } => {
                self.behavior.on_chat(&message).await;
                self.messages.push(message.clone());
            }
            ChatBody::UserConnected { roster } => {
                self.roster = roster.clone();
                self.behavior.on_roster(&self.roster).await;
            }
            ChatBody::UserDisconnected => {
                let gone = message.sender.id;
                self.roster.retain(|p| p.id != gone);
                self.behavior.on_roster(&self.roster).await;
            }
            ChatBody::TrackChange {
                action: TrackAction::Remove,
                track_ids,
            } => self.retire_sinks(track_ids).await,
            ChatBody::TrackChange { .. } => debug!("Ignoring track-change add"),
        }
    }

    /// Each sink is retired and reported at most once.
    async fn retire_sinks(&mut self, track_ids: &[TrackId]) {
        for id in track_ids {
            if self.sinks.remove(id).is_some() {
                debug!("Retired sink {}", id);
                self.behavior.on_track_removed(&self.identity, id).await;
            }
        }
    }

    /// Closes the session for good. Sinks go with it.
    async fn end_session(&mut self, status: ViewerStatus) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
        self.signaling.unregister_handler(&self.identity.id);

        for sink in self.sinks.drain() {
            self.behavior
                .on_track_removed(&self.identity, &sink.track_id)
                .await;
        }
        self.set_status(status).await;
    }

    async fn check_stalled(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_stalled(Instant::now(), self.config.connect_timeout) || !session.fail() {
            return;
        }
        warn!("Session to host stalled while connecting");
        self.behavior
            .on_peer_state(&self.identity, ConnectionState::Failed)
            .await;
        self.end_session(ViewerStatus::Disconnected).await;
    }

    async fn send_chat(&mut self, body: String) -> Result<ChatMessage, SendError> {
        let Some(session) = self.session.as_ref() else {
            return Err(SendError::NoChannel);
        };
        let message = ChatMessage::text(self.identity.clone(), body);
        session.send_message(&message).await?;

        self.behavior.on_chat(&message).await;
        self.messages.push(message.clone());
        Ok(message)
    }

    async fn handle_command(&mut self, cmd: ViewerCommand) -> ControlFlow<()> {
        match cmd {
            ViewerCommand::SendChat { body, reply } => {
                let result = self.send_chat(body).await;
                let _ = reply.send(result);
            }

            ViewerCommand::ToggleLocalMute { reply } => {
                let muted = !self.local_muted;
                for track in &self.voice_tracks {
                    track.set_enabled(!muted);
                }
                self.local_muted = muted;
                let _ = reply.send(muted);
            }

            ViewerCommand::ToggleRemote { track, reply } => {
                let _ = reply.send(self.sinks.toggle_mute(&track));
            }

            ViewerCommand::SetVolume {
                track,
                volume,
                reply,
            } => {
                let _ = reply.send(self.sinks.set_volume(&track, volume));
            }

            ViewerCommand::ToggleAllRemote { reply } => {
                let muted = !self.sinks.all_muted();
                self.sinks.set_all_muted(muted);
                let _ = reply.send(muted);
            }

            ViewerCommand::Roster { reply } => {
                let _ = reply.send(self.roster.clone());
            }

            ViewerCommand::Messages { reply } => {
                let _ = reply.send(self.messages.clone());
            }

            ViewerCommand::Sinks { reply } => {
                let _ = reply.send(self.sinks.snapshot());
            }

            ViewerCommand::Status { reply } => {
                let _ = reply.send(self.status);
            }

            ViewerCommand::Teardown { reply } => {
                self.teardown().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn teardown(&mut self) {
        info!("Tearing down viewer {}", self.identity);
        let status = if self.status == ViewerStatus::NoHost {
            ViewerStatus::NoHost
        } else {
            ViewerStatus::Disconnected
        };
        self.end_session(status).await;
        for track in &self.voice_tracks {
            track.stop();
        }
        self.relay_events = None;
    }
}
