use dashmap::DashMap;
use lounge_core::{Identity, ParticipantId, SignalMessage};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

struct RelayInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<SignalMessage>>,
    host: RwLock<Option<Identity>>,
}

/// One relay "room": at most one host, any number of viewers.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

/// The two halves of a client's link to the relay.
pub struct RelayConnection {
    /// Client -> relay.
    pub inbound: mpsc::UnboundedSender<SignalMessage>,
    /// Relay -> client.
    pub outbound: mpsc::UnboundedReceiver<SignalMessage>,
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                host: RwLock::new(None),
            }),
        }
    }

    pub async fn current_host(&self) -> Option<Identity> {
        self.inner.host.read().await.clone()
    }

    pub fn is_connected(&self, id: &ParticipantId) -> bool {
        self.inner.peers.contains_key(id)
    }

    /// Opens a new client connection. The connection lives until the
    /// client drops its `inbound` sender.
    pub fn attach(&self) -> RelayConnection {
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound) = mpsc::unbounded_channel();

        tokio::spawn(self.clone().serve_connection(inbound_rx, outbound_tx));

        RelayConnection { inbound, outbound }
    }

    async fn serve_connection(
        self,
        mut rx: mpsc::UnboundedReceiver<SignalMessage>,
        tx: mpsc::UnboundedSender<SignalMessage>,
    ) {
        let mut identity: Option<Identity> = None;

        while let Some(msg) = rx.recv().await {
            self.handle_message(&mut identity, &tx, msg).await;
        }

        if let Some(identity) = identity {
            self.detach(&identity, &tx).await;
        }
    }

    async fn handle_message(
        &self,
        identity: &mut Option<Identity>,
        tx: &mpsc::UnboundedSender<SignalMessage>,
        msg: SignalMessage,
    ) {
        debug!("Relay received '{}'", msg.event_name());

        if let SignalMessage::CreateUser(profile) = msg {
            if let Some(existing) = identity.as_ref() {
                warn!("Connection already registered as {}", existing);
                return;
            }
            if self.register(profile.clone(), tx).await {
                *identity = Some(profile);
            }
            return;
        }

        let Some(sender) = identity.as_ref() else {
            warn!("Dropping '{}' from unregistered connection", msg.event_name());
            return;
        };

        match msg {
            SignalMessage::CreateConnection(viewer) => {
                if viewer.id != sender.id {
                    warn!(
                        "{} tried to request a connection for {}",
                        sender, viewer
                    );
                    return;
                }
                match self.current_host().await {
                    Some(host) => self.send_to(&host.id, SignalMessage::CreateConnection(viewer)),
                    None => {
                        info!("No host for viewer {}", viewer);
                        let _ = tx.send(SignalMessage::NoHost { identity: viewer });
                    }
                }
            }

            SignalMessage::Sdp { .. }
            | SignalMessage::Ice { .. }
            | SignalMessage::TrackChange { .. } => self.route(sender, msg).await,

            other => warn!(
                "Dropping relay-only event '{}' sent by {}",
                other.event_name(),
                sender
            ),
        }
    }

    async fn register(&self, profile: Identity, tx: &mpsc::UnboundedSender<SignalMessage>) -> bool {
        if profile.is_host() {
            let mut host = self.inner.host.write().await;
            if let Some(existing) = host.as_ref().filter(|h| h.id != profile.id) {
                info!("Rejecting host {}: {} already hosts", profile, existing);
                let _ = tx.send(SignalMessage::HostAlreadyExists {
                    existing_host: existing.clone(),
                });
                return false;
            }
            *host = Some(profile.clone());
        }

        info!("Registered {:?} {}", profile.role, profile);
        self.inner.peers.insert(profile.id, tx.clone());
        let _ = tx.send(SignalMessage::UserCreated);
        true
    }

    /// Host-originated messages go to the viewer named by the payload;
    /// viewer-originated ones go to the host.
    async fn route(&self, sender: &Identity, msg: SignalMessage) {
        let Some(session) = msg.session().map(|s| s.id) else {
            return;
        };

        if sender.is_host() {
            self.send_to(&session, msg);
            return;
        }

        if session != sender.id {
            warn!(
                "Viewer {} tried to signal for session {}",
                sender, session
            );
            return;
        }

        match self.current_host().await {
            Some(host) => self.send_to(&host.id, msg),
            None => warn!("Dropping '{}': no host connected", msg.event_name()),
        }
    }

    fn send_to(&self, target: &ParticipantId, msg: SignalMessage) {
        if let Some(peer) = self.inner.peers.get(target) {
            if peer.send(msg).is_err() {
                warn!("Relay link to {} is closed", target);
            }
        } else {
            warn!(
                "Attempted to relay '{}' to disconnected participant {}",
                msg.event_name(),
                target
            );
        }
    }

    async fn detach(&self, identity: &Identity, tx: &mpsc::UnboundedSender<SignalMessage>) {
        self.inner
            .peers
            .remove_if(&identity.id, |_, peer| peer.same_channel(tx));

        let mut host = self.inner.host.write().await;
        if host.as_ref().is_some_and(|h| h.id == identity.id) && !self.is_connected(&identity.id) {
            info!("Host {} left; room is open", identity);
            *host = None;
        }

        info!("Relay connection closed for {}", identity);
    }
}
