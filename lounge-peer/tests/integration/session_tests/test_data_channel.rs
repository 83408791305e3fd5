use lounge_core::{ChatBody, ChatMessage, TrackAction, TrackId, TrackKind};
use lounge_peer::{LocalTrack, NegotiationRole, SendError};

use super::open_session;
use crate::utils::TransportOp;

#[tokio::test]
async fn test_send_before_channel_exists_reports_no_channel() {
    let h = open_session(NegotiationRole::Answerer, Vec::new()).await;

    let result = h
        .session
        .send_message(&ChatMessage::text(h.local.clone(), "hi"))
        .await;
    assert_eq!(result, Err(SendError::NoChannel));
}

#[tokio::test]
async fn test_send_before_channel_opens_reports_not_open() {
    let h = open_session(NegotiationRole::Offerer, Vec::new()).await;

    let result = h
        .session
        .send_message(&ChatMessage::text(h.local.clone(), "hi"))
        .await;
    assert_eq!(result, Err(SendError::NotOpen));

    h.transport.open_channel().await;
    let result = h
        .session
        .send_message(&ChatMessage::text(h.local.clone(), "hi"))
        .await;
    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn test_detach_announces_removed_tracks_once() {
    let mut h = open_session(NegotiationRole::Offerer, Vec::new()).await;
    h.transport.open_channel().await;

    let audio = LocalTrack::screen(h.local.id, TrackKind::Audio);
    let video = LocalTrack::screen(h.local.id, TrackKind::Video);
    assert!(h.session.attach_track(audio.clone()).await.unwrap());
    assert!(h.session.attach_track(video.clone()).await.unwrap());
    assert!(!h.session.attach_track(video.clone()).await.unwrap());

    let ids = vec![
        audio.id().clone(),
        video.id().clone(),
        TrackId::from("never-attached"),
    ];
    let removed = h.session.detach_tracks(&ids).await;
    assert_eq!(removed, vec![audio.id().clone(), video.id().clone()]);

    let notices = h.transport.sent_messages();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].sender, h.local);
    assert_eq!(
        notices[0].body,
        ChatBody::TrackChange {
            action: TrackAction::Remove,
            track_ids: removed.clone(),
        }
    );
    assert_eq!(
        h.transport
            .count(|op| matches!(op, TransportOp::RemoveTrack(_))),
        2
    );

    // Nothing left to detach: no second notice.
    assert!(h.session.detach_tracks(&ids).await.is_empty());
    assert_eq!(h.transport.sent_messages().len(), 1);
}
