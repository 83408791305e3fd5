use lounge_core::{Identity, Role};
use lounge_relay::RelayService;

use crate::integration::{eventually, init_tracing};
use crate::utils::RelayClient;

#[tokio::test]
async fn test_host_slot_released_when_host_leaves() {
    init_tracing();

    let service = RelayService::new();
    let host = Identity::new("Host", Role::Host);
    let client = RelayClient::join(&service, host.clone())
        .await
        .expect("Host should register");

    drop(client);

    let released = eventually(2000, || {
        let service = service.clone();
        async move { service.current_host().await.is_none() }
    })
    .await;
    assert!(released, "Host slot should be released");
    assert!(!service.is_connected(&host.id));

    let next = Identity::new("Next", Role::Host);
    RelayClient::join(&service, next.clone())
        .await
        .expect("A new host should be accepted");
    assert_eq!(service.current_host().await, Some(next));
}
