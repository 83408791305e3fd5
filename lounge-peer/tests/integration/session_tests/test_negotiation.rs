use lounge_core::{SdpKind, SessionDescription, TrackKind};
use lounge_peer::{LocalTrack, NegotiationRole, TransportEvent};

use super::open_session;
use crate::utils::TransportOp;

#[tokio::test]
async fn test_offerer_opens_with_channel_and_audio_slot() {
    let h = open_session(NegotiationRole::Offerer, Vec::new()).await;

    let ops = h.transport.ops();
    assert!(ops.contains(&TransportOp::ReceiveOnly(TrackKind::Audio)));
    assert!(ops.contains(&TransportOp::CreateDataChannel("general".into())));
    assert_eq!(h.session.state(), lounge_peer::ConnectionState::Connecting);
}

#[tokio::test]
async fn test_offerer_with_microphone_skips_receive_slot() {
    let mic = LocalTrack::microphone(lounge_core::ParticipantId::new());
    let h = open_session(NegotiationRole::Offerer, vec![mic.clone()]).await;

    assert_eq!(h.transport.added_tracks(), vec![mic.id().clone()]);
    assert_eq!(
        h.transport
            .count(|op| matches!(op, TransportOp::ReceiveOnly(_))),
        0
    );
    assert!(h.session.has_local_track(mic.id()));
}

#[tokio::test]
async fn test_answerer_creates_no_channel() {
    let mut h = open_session(NegotiationRole::Answerer, Vec::new()).await;

    assert_eq!(
        h.transport
            .count(|op| matches!(op, TransportOp::CreateDataChannel(_))),
        0
    );
    // Answerers never offer, even when asked to.
    h.session.negotiate().await.unwrap();
    assert_eq!(h.transport.offers_created(), 0);
}

#[tokio::test]
async fn test_opening_requests_negotiation_once() {
    let mut h = open_session(NegotiationRole::Offerer, Vec::new()).await;

    let event = h.events.try_recv().expect("negotiation-needed queued");
    assert!(matches!(event, TransportEvent::NegotiationNeeded(key) if key.viewer == h.viewer.id));
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_concurrent_negotiation_is_coalesced() {
    let mut h = open_session(NegotiationRole::Offerer, Vec::new()).await;

    h.session.negotiate().await.unwrap();
    h.session.negotiate().await.unwrap();
    h.session.negotiate().await.unwrap();

    assert!(h.session.is_negotiating());
    assert_eq!(h.transport.offers_created(), 1, "Only one offer may be in flight");

    h.session
        .apply_description(SessionDescription::answer("answer"))
        .await
        .unwrap();

    // The coalesced request becomes exactly one follow-up offer.
    assert_eq!(h.transport.offers_created(), 2);
    let offers = h.signaling.descriptions(SdpKind::Offer).await;
    assert_eq!(
        offers.iter().map(|d| d.sdp.as_str()).collect::<Vec<_>>(),
        vec!["offer-0", "offer-1"]
    );

    h.session
        .apply_description(SessionDescription::answer("answer"))
        .await
        .unwrap();
    assert!(!h.session.is_negotiating());
    assert_eq!(h.transport.offers_created(), 2);
}

#[tokio::test]
async fn test_offer_at_offerer_is_dropped() {
    let mut h = open_session(NegotiationRole::Offerer, Vec::new()).await;
    h.session.negotiate().await.unwrap();

    h.session
        .apply_description(SessionDescription::offer("colliding"))
        .await
        .unwrap();

    assert_eq!(
        h.transport
            .count(|op| matches!(op, TransportOp::SetRemote(_))),
        0
    );
    assert!(h.session.is_negotiating(), "Own offer stays in flight");
}

#[tokio::test]
async fn test_unsolicited_answer_is_dropped() {
    let mut h = open_session(NegotiationRole::Offerer, Vec::new()).await;

    h.session
        .apply_description(SessionDescription::answer("stray"))
        .await
        .unwrap();

    assert_eq!(
        h.transport
            .count(|op| matches!(op, TransportOp::SetRemote(_))),
        0
    );
}

#[tokio::test]
async fn test_answerer_answers_each_offer() {
    let mut h = open_session(NegotiationRole::Answerer, Vec::new()).await;

    h.session
        .apply_description(SessionDescription::offer("offer-0"))
        .await
        .unwrap();
    h.session
        .apply_description(SessionDescription::offer("offer-1"))
        .await
        .unwrap();

    let answers = h.signaling.descriptions(SdpKind::Answer).await;
    assert_eq!(answers.len(), 2);
    assert_eq!(
        h.transport
            .count(|op| matches!(op, TransportOp::CreateAnswer)),
        2
    );
}

#[tokio::test]
async fn test_answer_at_answerer_is_dropped() {
    let mut h = open_session(NegotiationRole::Answerer, Vec::new()).await;

    h.session
        .apply_description(SessionDescription::answer("answer"))
        .await
        .unwrap();

    assert!(h.transport.ops().iter().all(|op| !matches!(op, TransportOp::SetRemote(_))));
    assert!(h.signaling.signals().await.is_empty());
}
