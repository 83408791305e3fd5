use lounge_core::{ChatMessage, SignalMessage, TrackAction, TrackId, TrackKind};
use lounge_peer::RemoteTrack;

use crate::integration::ViewerFixture;
use crate::utils::{BehaviorEvent, EVENT_TIMEOUT_MS, settle};

async fn wait_sinks(fixture: &ViewerFixture, len: usize) -> bool {
    let start = std::time::Instant::now();
    loop {
        if fixture.viewer.sinks().await.unwrap().len() == len {
            return true;
        }
        if start.elapsed().as_millis() as u64 > EVENT_TIMEOUT_MS {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

async fn receive_track(fixture: &ViewerFixture, id: &str, kind: TrackKind) {
    let before = fixture.viewer.sinks().await.unwrap().len();
    fixture
        .transport
        .arrive_track(RemoteTrack::new(
            fixture.raw_host.identity.id,
            id,
            kind,
            "screen",
        ))
        .await;
    assert!(wait_sinks(fixture, before + 1).await, "Sink for {id} never appeared");
}

#[tokio::test]
async fn test_inbound_track_creates_sink() {
    let fixture = ViewerFixture::start().await;

    receive_track(&fixture, "screen-video", TrackKind::Video).await;

    let sinks = fixture.viewer.sinks().await.unwrap();
    assert_eq!(sinks[0].track_id, TrackId::from("screen-video"));
    assert_eq!(sinks[0].volume, 1.0);
    assert!(!sinks[0].muted);
    assert_eq!(
        fixture
            .behavior
            .count(|e| matches!(e, BehaviorEvent::TrackAdded { .. }))
            .await,
        1
    );
}

#[tokio::test]
async fn test_sink_is_removed_exactly_once() {
    let mut fixture = ViewerFixture::start().await;
    receive_track(&fixture, "screen-video", TrackKind::Video).await;
    let id = TrackId::from("screen-video");

    // The same removal arrives over signaling, the data channel and the
    // transport.
    fixture
        .raw_host
        .send(SignalMessage::TrackChange {
            identity: fixture.identity.clone(),
            action: TrackAction::Remove,
            track_ids: vec![id.clone()],
        })
        .unwrap();
    fixture
        .transport
        .deliver(&ChatMessage::track_removed(
            fixture.host_identity(),
            vec![id.clone()],
        ))
        .await;
    fixture.transport.end_track("screen-video").await;

    assert!(wait_sinks(&fixture, 0).await);
    settle().await;
    assert_eq!(fixture.behavior.track_removals(&id).await, 1);

    fixture.raw_host.drain_for(20).await;
}

#[tokio::test]
async fn test_mute_toggles_flip_and_restore() {
    let fixture = ViewerFixture::start().await;
    receive_track(&fixture, "host-mic", TrackKind::Audio).await;
    let id = TrackId::from("host-mic");

    assert_eq!(fixture.viewer.toggle_remote(id.clone()).await.unwrap(), Some(true));
    assert_eq!(fixture.viewer.toggle_remote(id.clone()).await.unwrap(), Some(false));
    assert!(!fixture.viewer.sinks().await.unwrap()[0].muted);

    assert_eq!(
        fixture
            .viewer
            .toggle_remote(TrackId::from("unknown"))
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        fixture.viewer.set_volume(id.clone(), 3.5).await.unwrap(),
        Some(1.0)
    );
}

#[tokio::test]
async fn test_mute_all_covers_later_tracks() {
    let fixture = ViewerFixture::start().await;
    receive_track(&fixture, "host-mic", TrackKind::Audio).await;

    assert!(fixture.viewer.toggle_all_remote().await.unwrap());
    receive_track(&fixture, "screen-audio", TrackKind::Audio).await;
    assert!(fixture.viewer.sinks().await.unwrap().iter().all(|s| s.muted));

    assert!(!fixture.viewer.toggle_all_remote().await.unwrap());
    assert!(fixture.viewer.sinks().await.unwrap().iter().all(|s| !s.muted));
}

#[tokio::test]
async fn test_local_mute_round_trips() {
    let fixture = ViewerFixture::start().await;

    assert!(fixture.viewer.toggle_local_mute().await.unwrap());
    assert!(!fixture.viewer.toggle_local_mute().await.unwrap());
}

#[tokio::test]
async fn test_session_end_retires_remaining_sinks() {
    let fixture = ViewerFixture::start().await;
    receive_track(&fixture, "host-mic", TrackKind::Audio).await;
    receive_track(&fixture, "screen-video", TrackKind::Video).await;

    fixture
        .transport
        .set_state(lounge_peer::ConnectionState::Disconnected)
        .await;

    assert!(wait_sinks(&fixture, 0).await);
    assert_eq!(
        fixture
            .behavior
            .count(|e| matches!(e, BehaviorEvent::TrackRemoved { .. }))
            .await,
        2
    );
}
