use lounge_core::{Identity, Role};
use lounge_peer::{
    ConnectError, HostOrchestrator, LocalTrack, SignalingClient, SignalingError, StaticMedia,
    ViewerClient,
};
use lounge_relay::RelayService;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::integration::{HostFixture, init_tracing, signaling_for, test_config};
use crate::utils::{
    FakeTransportFactory, PendingMedia, SilentConnector, TestBehavior, UnreachableConnector,
};

fn host_with(signaling: SignalingClient, config: lounge_peer::SessionConfig) -> HostOrchestrator {
    HostOrchestrator::new(
        config,
        Identity::new("Second Host", Role::Host),
        signaling,
        Arc::new(FakeTransportFactory::new()),
        Arc::new(TestBehavior::new()),
    )
}

#[tokio::test]
async fn test_second_host_is_rejected_and_releases_media() {
    let fixture = HostFixture::start().await;

    let mic = LocalTrack::microphone(lounge_core::ParticipantId::new());
    let result = host_with(signaling_for(&fixture.service), test_config())
        .connect(
            &StaticMedia::with_tracks(vec![mic.clone()]),
            CancellationToken::new(),
        )
        .await;

    match result {
        Err(ConnectError::HostAlreadyExists(existing)) => {
            assert_eq!(existing.id, fixture.identity.id)
        }
        other => panic!("expected HostAlreadyExists, got {:?}", other.err()),
    }
    assert!(mic.is_stopped());
    assert_eq!(
        fixture.service.current_host().await.map(|h| h.id),
        Some(fixture.identity.id)
    );
}

#[tokio::test]
async fn test_denied_microphone_fails_before_announcing() {
    init_tracing();
    let service = RelayService::new();

    let result = host_with(signaling_for(&service), test_config())
        .connect(&StaticMedia::unavailable(), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ConnectError::MediaUnavailable(_))));
    assert!(service.current_host().await.is_none());
}

#[tokio::test]
async fn test_cancel_aborts_pending_media_prompt() {
    init_tracing();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = host_with(signaling_for(&RelayService::new()), test_config())
        .connect(&PendingMedia, cancel)
        .await;

    assert!(matches!(result, Err(ConnectError::Cancelled)));
}

#[tokio::test]
async fn test_unreachable_relay_is_reported() {
    init_tracing();
    let signaling = SignalingClient::new(Arc::new(UnreachableConnector));
    let mic = LocalTrack::microphone(lounge_core::ParticipantId::new());

    let result = host_with(signaling, test_config())
        .connect(
            &StaticMedia::with_tracks(vec![mic.clone()]),
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(ConnectError::Signaling(SignalingError::Connect(_)))
    ));
    assert!(mic.is_stopped());
}

#[tokio::test]
async fn test_silent_relay_times_out() {
    init_tracing();
    let config = lounge_peer::SessionConfig {
        connect_timeout: Duration::from_millis(200),
        ..test_config()
    };
    let signaling = SignalingClient::new(Arc::new(SilentConnector::default()));

    let result = host_with(signaling, config)
        .connect(&StaticMedia::microphone(), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ConnectError::Timeout)));
}

#[tokio::test]
async fn test_client_announces_once() {
    init_tracing();
    let service = RelayService::new();
    let signaling = signaling_for(&service);
    let identity = Identity::new("Viewer", Role::Viewer);

    let _events = signaling.announce(&identity).await.unwrap();
    let again = signaling.announce(&identity).await;
    assert!(matches!(again, Err(SignalingError::AlreadyAnnounced)));
}

#[tokio::test]
async fn test_viewer_connect_cancelled_before_registration() {
    init_tracing();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = ViewerClient::new(
        test_config(),
        Identity::new("Viewer", Role::Viewer),
        SignalingClient::new(Arc::new(SilentConnector::default())),
        Arc::new(FakeTransportFactory::new()),
        Arc::new(TestBehavior::new()),
    )
    .connect(&PendingMedia, cancel)
    .await;

    assert!(matches!(result, Err(ConnectError::Cancelled)));
}
