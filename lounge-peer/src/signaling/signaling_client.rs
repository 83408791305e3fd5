use crate::error::SignalingError;
use crate::signaling::{RelayConnector, RelayEvent, RelayEvents, SignalingOutput};
use async_trait::async_trait;
use dashmap::DashMap;
use lounge_core::{IceCandidate, Identity, ParticipantId, SessionDescription, SignalMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type Handler = mpsc::UnboundedSender<SignalMessage>;

struct ClientInner {
    connector: Arc<dyn RelayConnector>,
    announced: AtomicBool,
    outbound: OnceLock<mpsc::UnboundedSender<SignalMessage>>,
    handlers: DashMap<ParticipantId, Handler>,
}

/// A participant's single relay connection, multiplexing every session's
/// handshake by viewer id.
#[derive(Clone)]
pub struct SignalingClient {
    inner: Arc<ClientInner>,
}

impl SignalingClient {
    pub fn new(connector: Arc<dyn RelayConnector>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                connector,
                announced: AtomicBool::new(false),
                outbound: OnceLock::new(),
                handlers: DashMap::new(),
            }),
        }
    }

    /// Connects to the relay and registers `identity`. Allowed once per
    /// client; a failed connect may be retried.
    pub async fn announce(&self, identity: &Identity) -> Result<RelayEvents, SignalingError> {
        if self.inner.announced.swap(true, Ordering::SeqCst) {
            return Err(SignalingError::AlreadyAnnounced);
        }

        let link = match self.inner.connector.connect().await {
            Ok(link) => link,
            Err(e) => {
                self.inner.announced.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        link.outbound
            .send(SignalMessage::CreateUser(identity.clone()))
            .map_err(|_| SignalingError::Closed)?;
        let _ = self.inner.outbound.set(link.outbound);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(self.inner.clone(), link.inbound, events_tx));

        info!("Announced {} to relay", identity);
        Ok(events_rx)
    }

    /// Routes signals concerning `session` to `handler`. A later
    /// registration for the same id replaces the earlier one.
    pub fn register_handler(&self, session: ParticipantId, handler: Handler) {
        if self.inner.handlers.insert(session, handler).is_some() {
            debug!("Replaced signal handler for {}", session);
        }
    }

    pub fn unregister_handler(&self, session: &ParticipantId) {
        self.inner.handlers.remove(session);
    }

    pub fn has_handler(&self, session: &ParticipantId) -> bool {
        self.inner.handlers.contains_key(session)
    }

    /// Fire-and-forget.
    pub fn send(&self, msg: SignalMessage) {
        let Some(outbound) = self.inner.outbound.get() else {
            warn!("Dropping '{}': relay not connected", msg.event_name());
            return;
        };
        if outbound.send(msg).is_err() {
            warn!("Relay link closed; signal dropped");
        }
    }
}

async fn dispatch(
    inner: Arc<ClientInner>,
    mut inbound: mpsc::UnboundedReceiver<SignalMessage>,
    events: mpsc::UnboundedSender<RelayEvent>,
) {
    let mut registered = false;
    let mut rejected = false;

    while let Some(msg) = inbound.recv().await {
        match msg {
            SignalMessage::UserCreated => {
                if !registered {
                    registered = true;
                    let _ = events.send(RelayEvent::Registered);
                }
            }

            SignalMessage::HostAlreadyExists { existing_host } => {
                if !rejected {
                    rejected = true;
                    let _ = events.send(RelayEvent::HostAlreadyExists(existing_host));
                }
            }

            SignalMessage::CreateConnection(viewer) => {
                let _ = events.send(RelayEvent::CreateConnectionRequest(viewer));
            }

            SignalMessage::CreateUser(_) => {
                warn!("Relay sent 'create-user'; dropping");
            }

            addressed => {
                let Some(session) = addressed.session().map(|s| s.id) else {
                    continue;
                };
                let delivered = inner
                    .handlers
                    .get(&session)
                    .map(|handler| handler.send(addressed.clone()).is_ok())
                    .unwrap_or(false);
                if !delivered {
                    warn!(
                        "No handler for '{}' addressed to {}",
                        addressed.event_name(),
                        session
                    );
                }
            }
        }
    }

    info!("Relay connection closed");
    let _ = events.send(RelayEvent::Closed);
}

#[async_trait]
impl SignalingOutput for SignalingClient {
    async fn send_description(&self, session: &Identity, description: SessionDescription) {
        self.send(SignalMessage::Sdp {
            identity: session.clone(),
            description,
        });
    }

    async fn send_ice(&self, session: &Identity, candidate: IceCandidate) {
        self.send(SignalMessage::Ice {
            identity: session.clone(),
            candidate,
        });
    }
}
