use lounge_core::{IceCandidate, SdpKind, SessionDescription, SignalMessage};

use crate::integration::ViewerFixture;
use crate::utils::{EVENT_TIMEOUT_MS, TransportOp};

#[tokio::test]
async fn test_viewer_answers_host_offer() {
    let mut fixture = ViewerFixture::start().await;

    fixture
        .raw_host
        .send(SignalMessage::Sdp {
            identity: fixture.identity.clone(),
            description: SessionDescription::offer("offer-0"),
        })
        .unwrap();

    let answer = fixture
        .raw_host
        .recv_map(|msg| match msg {
            SignalMessage::Sdp {
                identity,
                description,
            } if description.kind == SdpKind::Answer => Some((identity, description)),
            _ => None,
        })
        .await
        .unwrap();
    assert_eq!(answer.0, fixture.identity);

    // The viewer's microphone goes out on its only session.
    let mic = format!("mic-{}", fixture.identity.id);
    assert!(fixture.transport.added_tracks().contains(&mic.as_str().into()));
    assert_eq!(fixture.transport.offers_created(), 0);
}

#[tokio::test]
async fn test_host_candidates_before_offer_are_applied_after_it() {
    let mut fixture = ViewerFixture::start().await;
    let session = fixture.identity.clone();

    for candidate in ["host-a", "host-b"] {
        fixture
            .raw_host
            .send(SignalMessage::Ice {
                identity: session.clone(),
                candidate: IceCandidate::new(candidate),
            })
            .unwrap();
    }
    crate::utils::settle().await;
    assert!(fixture.transport.applied_candidates().is_empty());

    fixture
        .raw_host
        .send(SignalMessage::Sdp {
            identity: session.clone(),
            description: SessionDescription::offer("offer-0"),
        })
        .unwrap();

    assert!(
        fixture
            .transport
            .wait_until(EVENT_TIMEOUT_MS, |ops| ops
                .iter()
                .filter(|op| matches!(op, TransportOp::AddCandidate(_)))
                .count()
                == 2)
            .await
    );
    let ops = fixture.transport.ops();
    let set_remote = ops
        .iter()
        .position(|op| *op == TransportOp::SetRemote(SdpKind::Offer))
        .unwrap();
    let first_candidate = ops
        .iter()
        .position(|op| matches!(op, TransportOp::AddCandidate(_)))
        .unwrap();
    assert!(set_remote < first_candidate);
    assert_eq!(fixture.transport.applied_candidates(), vec!["host-a", "host-b"]);

    // Drain the answer so the relay link stays tidy.
    fixture.raw_host.drain_for(50).await;
}

#[tokio::test]
async fn test_local_candidates_reach_the_host() {
    let mut fixture = ViewerFixture::start().await;

    fixture.transport.local_candidate("viewer-candidate").await;

    let (identity, candidate) = fixture
        .raw_host
        .recv_map(|msg| match msg {
            SignalMessage::Ice {
                identity,
                candidate,
            } => Some((identity, candidate)),
            _ => None,
        })
        .await
        .unwrap();
    assert_eq!(identity, fixture.identity);
    assert_eq!(candidate.candidate, "viewer-candidate");
}
