mod test_data_channel;
mod test_negotiation;

use lounge_core::{Identity, Role};
use lounge_peer::{LocalTrack, NegotiationRole, PeerSession, SessionKey, TransportEvent};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::integration::{init_tracing, test_config};
use crate::utils::{FakeTransport, MockSignalingOutput};

pub struct SessionHarness {
    pub session: PeerSession,
    pub transport: Arc<FakeTransport>,
    pub signaling: MockSignalingOutput,
    pub events: mpsc::Receiver<TransportEvent>,
    pub local: Identity,
    pub viewer: Identity,
}

pub async fn open_session(role: NegotiationRole, tracks: Vec<LocalTrack>) -> SessionHarness {
    init_tracing();
    let (local, viewer) = match role {
        NegotiationRole::Offerer => {
            let viewer = Identity::new("Viewer", Role::Viewer);
            (Identity::new("Host", Role::Host), viewer)
        }
        NegotiationRole::Answerer => {
            let viewer = Identity::new("Viewer", Role::Viewer);
            (viewer.clone(), viewer)
        }
    };

    let (events_tx, events) = mpsc::channel(64);
    let transport = Arc::new(FakeTransport::new(SessionKey::new(viewer.id, 0), events_tx));
    let signaling = MockSignalingOutput::new();

    let session = PeerSession::open(
        &test_config(),
        local.clone(),
        viewer.clone(),
        role,
        transport.clone(),
        Arc::new(signaling.clone()),
        tracks,
    )
    .await
    .expect("session should open");

    SessionHarness {
        session,
        transport,
        signaling,
        events,
        local,
        viewer,
    }
}
