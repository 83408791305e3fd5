use crate::behavior::ParticipantBehavior;
use crate::connect::acquire_and_register;
use crate::error::ConnectError;
use crate::host::{HostCommand, HostHandle, MediaOpts, ViewerEntry, ViewerRegistry};
use crate::media::{LocalTrack, MediaSource, RemoteTrack, SinkInfo};
use crate::router;
use crate::session::{ConnectionState, NegotiationRole, PeerSession, SessionConfig};
use crate::signaling::{RelayEvent, RelayEvents, SignalingClient, SignalingOutput};
use crate::transport::{SessionKey, TransportEvent, TransportFactory};
use bytes::Bytes;
use std::ops::ControlFlow;
use lounge_core::{ChatBody, ChatMessage, Identity, ParticipantId, SignalMessage, TrackAction, TrackId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 64;
const TRANSPORT_BUFFER: usize = 256;

/// The host side of the star: one offering session per viewer.
pub struct HostOrchestrator {
    config: SessionConfig,
    identity: Identity,
    signaling: SignalingClient,
    factory: Arc<dyn TransportFactory>,
    behavior: Arc<dyn ParticipantBehavior>,
}

impl HostOrchestrator {
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

    /// Acquires the microphone, claims the host slot and starts the actor.
    pub async fn connect(
        self,
        media: &dyn MediaSource,
        cancel: CancellationToken,
    ) -> Result<HostHandle, ConnectError> {
        let (voice, relay_events) = acquire_and_register(
            &self.config,
            &self.identity,
            &self.signaling,
            media,
            &cancel,
        )
        .await?;

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_BUFFER);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let actor = HostActor {
            signaling_out: Arc::new(self.signaling.clone()),
            config: self.config,
            identity: self.identity.clone(),
            signaling: self.signaling,
            factory: self.factory,
            behavior: self.behavior,
            registry: ViewerRegistry::new(),
            opts: MediaOpts::with_voice(voice),
            messages: Vec::new(),
            relay_operations: 0,
            next_epoch: 0,
            relay_events: Some(relay_events),
            command_rx,
            transport_rx,
            transport_tx,
            signal_rx,
            signal_tx,
        };
        tokio::spawn(actor.run());

        Ok(HostHandle::new(self.identity, command_tx))
    }
}

struct HostActor {
    config: SessionConfig,
    identity: Identity,
    signaling: SignalingClient,
    signaling_out: Arc<dyn SignalingOutput>,
    factory: Arc<dyn TransportFactory>,
    behavior: Arc<dyn ParticipantBehavior>,
    registry: ViewerRegistry,
    opts: MediaOpts,
    messages: Vec<ChatMessage>,
    relay_operations: u64,
    next_epoch: u64,
    relay_events: Option<RelayEvents>,
    command_rx: mpsc::Receiver<HostCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    signal_rx: mpsc::UnboundedReceiver<SignalMessage>,
    signal_tx: mpsc::UnboundedSender<SignalMessage>,
}

async fn next_relay_event(events: &mut Option<RelayEvents>) -> Option<RelayEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl HostActor {
    async fn run(mut self) {
        info!("Host {} event loop started", self.identity);

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
                            info!("All host handles dropped. Tearing down.");
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
                        Some(e) => self.handle_relay_event(e).await,
                        None => self.relay_events = None,
                    }
                }

                _ = stall_check.tick() => self.fail_stalled_sessions().await,
            }
        }

        info!("Host {} event loop finished", self.identity);
    }

    async fn handle_relay_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::CreateConnectionRequest(viewer) => self.accept_viewer(viewer).await,
            RelayEvent::Registered => {}
            RelayEvent::HostAlreadyExists(existing) => {
                warn!("Relay reports {} as host after registration", existing);
            }
            RelayEvent::Closed => {
                warn!("Relay connection lost; no new viewers can join");
                self.relay_events = None;
            }
        }
    }

    async fn accept_viewer(&mut self, viewer: Identity) {
        if viewer.id == self.identity.id {
            warn!("Ignoring connection request from the host itself");
            return;
        }
        info!("Processing connection request from {}", viewer);

        if self.registry.contains(&viewer.id) {
            info!("Replacing existing session for {}", viewer);
            self.remove_viewer(&viewer.id).await;
        }

        let key = SessionKey::new(viewer.id, self.next_epoch);
        self.next_epoch += 1;

        let transport = match self
            .factory
            .create(key, &self.config.transport, self.transport_tx.clone())
            .await
        {
            Ok(t) => t,
            Err(e) => {
                error!("Failed to create transport for {}: {:?}", viewer, e);
                return;
            }
        };

        // Late joiners also get every relayed viewer track.
        let mut tracks = self.opts.outbound_tracks();
        let mut relayed = 0;
        for entry in self.registry.values() {
            relayed += entry.relayed.len() as u64;
            tracks.extend(entry.relayed.iter().cloned());
        }

        let session = PeerSession::open(
            &self.config,
            self.identity.clone(),
            viewer.clone(),
            NegotiationRole::Offerer,
            transport.clone(),
            self.signaling_out.clone(),
            tracks,
        )
        .await;

        let session = match session {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to open session for {}: {:?}", viewer, e);
                let _ = transport.close().await;
                return;
            }
        };

        self.relay_operations += relayed;
        self.signaling.register_handler(viewer.id, self.signal_tx.clone());
        self.registry
            .insert(ViewerEntry::new(key, session, self.opts.all_remote_muted));
        self.behavior
            .on_peer_state(&viewer, ConnectionState::Connecting)
            .await;
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        let Some(viewer_id) = msg.session().map(|s| s.id) else {
            return;
        };
        let Some(entry) = self.registry.get_mut(&viewer_id) else {
            warn!("Signal '{}' for unknown viewer {}", msg.event_name(), viewer_id);
            return;
        };

        match msg {
            SignalMessage::Sdp { description, .. } => {
                if let Err(e) = entry.session.apply_description(description).await {
                    warn!("Failed to apply description from {}: {:?}", entry.identity, e);
                }
            }
            SignalMessage::Ice { candidate, .. } => {
                if let Err(e) = entry.session.add_remote_candidate(candidate).await {
                    warn!("Failed to add ICE candidate for {}: {:?}", entry.identity, e);
                }
            }
            SignalMessage::TrackChange {
                action: TrackAction::Remove,
                track_ids,
                ..
            } => self.retire_sinks(&viewer_id, &track_ids).await,
            other => debug!("Host ignoring '{}' for {}", other.event_name(), viewer_id),
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let key = event.session();
        let viewer_id = key.viewer;
        let Some(entry) = self.registry.get_mut(&viewer_id) else {
            debug!("Dropping transport event for closed session {}", key);
            return;
        };
        if entry.key != key {
            debug!("Dropping transport event from replaced session {}", key);
            return;
        }

        match event {
            TransportEvent::StateChanged(_, state) => {
                let Some(next) = entry.session.on_state(state) else {
                    return;
                };
                let identity = entry.identity.clone();
                self.behavior.on_peer_state(&identity, next).await;
                if next.is_terminal() {
                    self.remove_viewer(&viewer_id).await;
                }
            }

            TransportEvent::CandidateGenerated(_, candidate) => {
                entry.session.send_local_candidate(candidate).await;
            }

            TransportEvent::NegotiationNeeded(_) => {
                if let Err(e) = entry.session.negotiate().await {
                    warn!("Negotiation with {} failed: {:?}", entry.identity, e);
                }
            }

            TransportEvent::TrackArrived(_, track) => self.relay_track(&viewer_id, track).await,

            TransportEvent::TrackEnded(_, track_id) => self.track_ended(&viewer_id, track_id).await,

            TransportEvent::DataChannelReady(_) => {
                info!("Viewer {} fully joined (data channel ready)", entry.identity);
                entry.session.mark_channel_open();
                entry.joined = true;
                self.broadcast_roster().await;
            }

            TransportEvent::Message(_, data) => self.on_viewer_message(&viewer_id, data).await,
        }
    }

    /// Relays a viewer's inbound track to every other session.
    async fn relay_track(&mut self, origin: &ParticipantId, track: RemoteTrack) {
        let Some(entry) = self.registry.get_mut(origin) else {
            return;
        };
        if !entry.session.track_arrived(track.clone()) {
            return;
        }

        let sink = SinkInfo::new(track.id().clone(), track.kind(), track.stream_id());
        entry.sinks.insert(sink);
        let mirror = track.mirror().clone();
        entry.relayed.push(mirror.clone());
        let identity = entry.identity.clone();
        if let Some(sink) = entry.sinks.get(track.id()).cloned() {
            self.behavior.on_track_added(&identity, &sink).await;
        }

        for id in self.registry.ids() {
            if id == *origin {
                continue;
            }
            let Some(other) = self.registry.get_mut(&id) else {
                continue;
            };
            match other.session.attach_track(mirror.clone()).await {
                Ok(true) => self.relay_operations += 1,
                Ok(false) => {}
                Err(e) => warn!("Failed to relay {} to {}: {:?}", mirror.id(), other.identity, e),
            }
        }
        debug!("Relayed track {} from {}", track.id(), identity);
    }

    async fn track_ended(&mut self, origin: &ParticipantId, track_id: TrackId) {
        let Some(entry) = self.registry.get_mut(origin) else {
            return;
        };
        entry.session.track_ended(&track_id);
        entry.relayed.retain(|t| t.id() != &track_id);
        self.retire_sinks(origin, std::slice::from_ref(&track_id)).await;
        self.detach_from_others(origin, &[track_id]).await;
    }

    async fn retire_sinks(&mut self, viewer: &ParticipantId, track_ids: &[TrackId]) {
        let Some(entry) = self.registry.get_mut(viewer) else {
            return;
        };
        let identity = entry.identity.clone();
        let removed: Vec<TrackId> = track_ids
            .iter()
            .filter_map(|id| entry.sinks.remove(id).map(|s| s.track_id))
            .collect();

        for id in &removed {
            self.behavior.on_track_removed(&identity, id).await;
        }
    }

    async fn detach_from_others(&mut self, origin: &ParticipantId, track_ids: &[TrackId]) {
        if track_ids.is_empty() {
            return;
        }
        for id in self.registry.ids() {
            if id == *origin {
                continue;
            }
            if let Some(other) = self.registry.get_mut(&id) {
                other.session.detach_tracks(track_ids).await;
            }
        }
    }

    async fn on_viewer_message(&mut self, viewer_id: &ParticipantId, data: Bytes) {
        let Some(message) = router::decode(*viewer_id, &data) else {
            return;
        };
        let Some(entry) = self.registry.get(viewer_id) else {
            return;
        };

        if message.sender.id != *viewer_id {
            warn!(
                "Message sender {} does not match session {}",
                message.sender, entry.identity
            );
        }
        let message = ChatMessage {
            sender: entry.identity.clone(),
            body: message.body,
        };

        match &message.body {
            ChatBody::Text { .. } => {
                self.messages.push(message.clone());
                self.behavior.on_chat(&message).await;
                self.broadcast(&message, Some(viewer_id)).await;
            }
            ChatBody::TrackChange {
                action: TrackAction::Remove,
                track_ids,
            } => {
                let track_ids = track_ids.clone();
                self.retire_sinks(viewer_id, &track_ids).await;
            }
            other => debug!("Host ignoring '{}' from {}", other.kind(), message.sender),
        }
    }

    /// Sends to every session except `except`. Failures are per-viewer and
    /// do not stop the broadcast.
    async fn broadcast(&self, message: &ChatMessage, except: Option<&ParticipantId>) {
        for id in self.registry.ids() {
            if Some(&id) == except {
                continue;
            }
            let Some(entry) = self.registry.get(&id) else {
                continue;
            };
            if let Err(e) = entry.session.send_message(message).await {
                debug!("'{}' to {} not delivered: {}", message.body.kind(), entry.identity, e);
            }
        }
    }

    fn roster(&self) -> Vec<Identity> {
        std::iter::once(self.identity.clone())
            .chain(self.registry.identities())
            .collect()
    }

    async fn broadcast_roster(&self) {
        let roster = self.roster();
        self.behavior.on_roster(&roster).await;
        let message = ChatMessage::user_connected(self.identity.clone(), roster);
        self.broadcast(&message, None).await;
    }

    /// Closes a viewer's session and undoes everything it contributed to
    /// the other sessions.
    async fn remove_viewer(&mut self, viewer_id: &ParticipantId) {
        let Some(mut entry) = self.registry.remove(viewer_id) else {
            return;
        };
        info!("Removing viewer {}", entry.identity);

        self.signaling.unregister_handler(viewer_id);
        entry.session.close().await;

        for sink in entry.sinks.drain() {
            self.behavior
                .on_track_removed(&entry.identity, &sink.track_id)
                .await;
        }

        let relayed: Vec<TrackId> = entry.relayed.iter().map(|t| t.id().clone()).collect();
        self.detach_from_others(viewer_id, &relayed).await;
        for track in &entry.relayed {
            track.stop();
        }

        let notice = ChatMessage::user_disconnected(entry.identity.clone());
        self.broadcast(&notice, None).await;
        self.behavior.on_roster(&self.roster()).await;
    }

    async fn fail_stalled_sessions(&mut self) {
        let now = Instant::now();
        let timeout = self.config.connect_timeout;

        for id in self.registry.ids() {
            let Some(entry) = self.registry.get_mut(&id) else {
                continue;
            };
            if entry.session.is_offer_stalled(now, timeout) {
                if let Err(e) = entry.session.restart_offer().await {
                    warn!("Renegotiation with {} failed: {:?}", entry.identity, e);
                }
                continue;
            }
            if !entry.session.is_stalled(now, timeout) || !entry.session.fail() {
                continue;
            }
            warn!("Session with {} stalled while connecting", entry.identity);
            let identity = entry.identity.clone();
            self.behavior
                .on_peer_state(&identity, ConnectionState::Failed)
                .await;
            self.remove_viewer(&id).await;
        }
    }

    async fn handle_command(&mut self, cmd: HostCommand) -> ControlFlow<()> {
        match cmd {
            HostCommand::SendChat { body, reply } => {
                let message = ChatMessage::text(self.identity.clone(), body);
                self.messages.push(message.clone());
                self.behavior.on_chat(&message).await;
                self.broadcast(&message, None).await;
                let _ = reply.send(message);
            }

            HostCommand::ShareScreen { tracks, reply } => {
                self.share_screen(tracks).await;
                let _ = reply.send(());
            }

            HostCommand::StopScreenShare { reply } => {
                self.stop_screen_share().await;
                let _ = reply.send(());
            }

            HostCommand::ToggleLocalMute { reply } => {
                let muted = !self.opts.local_muted;
                for track in &self.opts.voice_tracks {
                    track.set_enabled(!muted);
                }
                self.opts.local_muted = muted;
                info!("Host microphone muted: {}", muted);
                let _ = reply.send(muted);
            }

            HostCommand::ToggleRemote { viewer, reply } => {
                let muted = self.registry.get_mut(&viewer).map(|entry| {
                    let muted = !entry.sinks.all_muted();
                    entry.sinks.set_all_muted(muted);
                    muted
                });
                let _ = reply.send(muted);
            }

            HostCommand::ToggleAllRemote { reply } => {
                let muted = !self.opts.all_remote_muted;
                self.opts.all_remote_muted = muted;
                for entry in self.registry.values_mut() {
                    entry.sinks.set_all_muted(muted);
                }
                let _ = reply.send(muted);
            }

            HostCommand::Viewers { reply } => {
                let _ = reply.send(self.registry.info());
            }

            HostCommand::Messages { reply } => {
                let _ = reply.send(self.messages.clone());
            }

            HostCommand::MediaOpts { reply } => {
                let _ = reply.send(self.opts.clone());
            }

            HostCommand::RelayOperations { reply } => {
                let _ = reply.send(self.relay_operations);
            }

            HostCommand::Teardown { reply } => {
                self.teardown().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn share_screen(&mut self, tracks: Vec<LocalTrack>) {
        if self.opts.screen {
            self.stop_screen_share().await;
        }
        info!("Host sharing screen ({} tracks)", tracks.len());

        for id in self.registry.ids() {
            let Some(entry) = self.registry.get_mut(&id) else {
                continue;
            };
            for track in &tracks {
                match entry.session.attach_track(track.clone()).await {
                    Ok(true) => self.relay_operations += 1,
                    Ok(false) => {}
                    Err(e) => warn!("Failed to share screen with {}: {:?}", entry.identity, e),
                }
            }
        }

        self.opts.screen_tracks = tracks;
        self.opts.screen = true;
    }

    async fn stop_screen_share(&mut self) {
        if !self.opts.screen {
            return;
        }
        let tracks = std::mem::take(&mut self.opts.screen_tracks);
        let ids: Vec<TrackId> = tracks.iter().map(|t| t.id().clone()).collect();

        for id in self.registry.ids() {
            if let Some(entry) = self.registry.get_mut(&id) {
                entry.session.detach_tracks(&ids).await;
            }
        }
        for track in &tracks {
            track.stop();
        }
        self.opts.screen = false;
        info!("Host stopped screen share");
    }

    async fn teardown(&mut self) {
        info!("Tearing down host {}", self.identity);

        for id in self.registry.ids() {
            let Some(mut entry) = self.registry.remove(&id) else {
                continue;
            };
            self.signaling.unregister_handler(&id);
            entry.session.close().await;
            for track in &entry.relayed {
                track.stop();
            }
        }

        for track in self
            .opts
            .voice_tracks
            .iter()
            .chain(self.opts.screen_tracks.iter())
        {
            track.stop();
        }
        self.opts.screen = false;
        self.opts.screen_tracks.clear();
        self.relay_events = None;
    }
}
