use async_trait::async_trait;
use lounge_core::{IceCandidate, Identity, SdpKind, SessionDescription};
use lounge_peer::SignalingOutput;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundSignal {
    Description {
        session: Identity,
        description: SessionDescription,
    },
    Ice {
        session: Identity,
        candidate: IceCandidate,
    },
}

/// Captures everything a session sends toward the relay.
#[derive(Clone, Default)]
pub struct MockSignalingOutput {
    signals: Arc<Mutex<Vec<OutboundSignal>>>,
}

impl MockSignalingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn signals(&self) -> Vec<OutboundSignal> {
        self.signals.lock().await.clone()
    }

    pub async fn descriptions(&self, kind: SdpKind) -> Vec<SessionDescription> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                OutboundSignal::Description { description, .. } if description.kind == kind => {
                    Some(description.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub async fn candidates(&self) -> Vec<IceCandidate> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                OutboundSignal::Ice { candidate, .. } => Some(candidate.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_description(&self, session: &Identity, description: SessionDescription) {
        tracing::debug!("[MockSignaling] {:?} for {}", description.kind, session);
        self.signals.lock().await.push(OutboundSignal::Description {
            session: session.clone(),
            description,
        });
    }

    async fn send_ice(&self, session: &Identity, candidate: IceCandidate) {
        tracing::debug!("[MockSignaling] ice for {}", session);
        self.signals.lock().await.push(OutboundSignal::Ice {
            session: session.clone(),
            candidate,
        });
    }
}
