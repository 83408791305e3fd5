use lounge_core::{ChatMessage, Identity, Role};

use crate::integration::{HostFixture, texts};
use crate::utils::{BehaviorEvent, EVENT_TIMEOUT_MS, TransportOp, settle};

#[tokio::test]
async fn test_host_chat_reaches_each_viewer_once() {
    let fixture = HostFixture::start().await;
    let alice = fixture.join_open("Alice").await;
    let bob = fixture.join_open("Bob").await;

    let sent = fixture.host.send_chat("welcome").await.unwrap();
    assert_eq!(sent.sender, fixture.identity);

    for viewer in [&alice, &bob] {
        let received = viewer.transport.sent_messages();
        assert_eq!(texts(&received), vec!["welcome"]);
    }
    assert_eq!(fixture.host.messages().await.unwrap(), vec![sent.clone()]);
    assert_eq!(
        fixture
            .behavior
            .count(|e| matches!(e, BehaviorEvent::Chat(m) if *m == sent))
            .await,
        1
    );
}

#[tokio::test]
async fn test_viewer_chat_fans_out_without_echo() {
    let fixture = HostFixture::start().await;
    let alice = fixture.join_open("Alice").await;
    let bob = fixture.join_open("Bob").await;
    let carol = fixture.join_open("Carol").await;

    alice
        .transport
        .deliver(&ChatMessage::text(alice.peer.identity.clone(), "hello"))
        .await;

    for viewer in [&bob, &carol] {
        assert!(
            viewer
                .transport
                .wait_for_sent(EVENT_TIMEOUT_MS, |m| texts(m) == vec!["hello"])
                .await
        );
        let forwarded = viewer
            .transport
            .sent_messages()
            .into_iter()
            .find(|m| !texts(std::slice::from_ref(m)).is_empty())
            .unwrap();
        assert_eq!(forwarded.sender, alice.peer.identity);
    }

    settle().await;
    assert!(texts(&alice.transport.sent_messages()).is_empty(), "No echo to the sender");

    let history = fixture.host.messages().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender, alice.peer.identity);
}

#[tokio::test]
async fn test_sender_is_taken_from_the_session() {
    let fixture = HostFixture::start().await;
    let alice = fixture.join_open("Alice").await;
    let bob = fixture.join_open("Bob").await;

    let impostor = Identity::new("Not Alice", Role::Viewer);
    alice
        .transport
        .deliver(&ChatMessage::text(impostor, "trust me"))
        .await;

    assert!(
        bob.transport
            .wait_for_sent(EVENT_TIMEOUT_MS, |m| texts(m) == vec!["trust me"])
            .await
    );
    let history = fixture.host.messages().await.unwrap();
    assert_eq!(history[0].sender, alice.peer.identity);
}

#[tokio::test]
async fn test_malformed_and_unknown_messages_are_dropped() {
    let fixture = HostFixture::start().await;
    let alice = fixture.join_open("Alice").await;
    let bob = fixture.join_open("Bob").await;

    alice.transport.deliver_raw(b"{not json".to_vec()).await;
    let unknown = serde_json::json!({
        "type": "user-dp",
        "sender": alice.peer.identity,
        "data": "aGVsbG8=",
    });
    alice
        .transport
        .deliver_raw(unknown.to_string().into_bytes())
        .await;
    settle().await;

    assert!(fixture.host.messages().await.unwrap().is_empty());
    assert!(texts(&bob.transport.sent_messages()).is_empty());
    assert!(fixture.host.is_running());
}

#[tokio::test]
async fn test_chat_skips_viewers_without_open_channel() {
    let fixture = HostFixture::start().await;
    let alice = fixture.join_open("Alice").await;
    let pending = fixture.join("Bob").await;

    fixture.host.send_chat("early").await.unwrap();

    assert_eq!(texts(&alice.transport.sent_messages()), vec!["early"]);
    assert_eq!(
        pending
            .transport
            .count(|op| matches!(op, TransportOp::SendText(_))),
        0
    );
}

#[tokio::test]
async fn test_roster_is_broadcast_when_viewer_joins() {
    let fixture = HostFixture::start().await;
    let alice = fixture.join_open("Alice").await;
    let bob = fixture.join_open("Bob").await;

    let alice_id = alice.peer.identity.id;
    let bob_id = bob.peer.identity.id;
    let host_id = fixture.identity.id;

    // Both viewers see the roster that includes Bob.
    for viewer in [&alice, &bob] {
        let got = viewer
            .transport
            .wait_for_sent(EVENT_TIMEOUT_MS, |messages| {
                messages.iter().any(|m| match &m.body {
                    lounge_core::ChatBody::UserConnected { roster } => {
                        let ids: Vec<_> = roster.iter().map(|p| p.id).collect();
                        ids.contains(&host_id) && ids.contains(&alice_id) && ids.contains(&bob_id)
                    }
                    _ => false,
                })
            })
            .await;
        assert!(got, "{} never saw the full roster", viewer.peer.identity);
    }
}
