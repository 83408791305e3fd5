use lounge_core::{Identity, Role, SignalMessage};
use lounge_relay::RelayService;

use crate::integration::init_tracing;
use crate::utils::RelayClient;

#[tokio::test]
async fn test_second_host_rejected() {
    init_tracing();

    let service = RelayService::new();
    let host = Identity::new("First", Role::Host);
    let _first = RelayClient::join(&service, host.clone())
        .await
        .expect("First host should register");

    let contender = Identity::new("Second", Role::Host);
    let mut second = RelayClient::attach(&service, contender.clone());
    second
        .send(SignalMessage::CreateUser(contender.clone()))
        .unwrap();

    let reply = second.recv().await.expect("Relay should answer");
    assert_eq!(
        reply,
        SignalMessage::HostAlreadyExists {
            existing_host: host.clone()
        }
    );

    assert_eq!(service.current_host().await, Some(host));
    assert!(!service.is_connected(&contender.id));
    assert!(second.is_quiet_for(100).await, "No user-created after rejection");
}
