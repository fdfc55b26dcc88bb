use rendezvous_core::PeerId;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{
    DECISION_TIMEOUT_MS, QUIET_PERIOD_MS, TransportCall, create_default_session,
};

#[tokio::test]
async fn test_two_sessions_single_initiator() {
    init_tracing();

    let (alice, alice_transport, _alice_rx) = create_default_session("alice", 1000);
    let (bob, bob_transport, _bob_rx) = create_default_session("bob", 2000);

    alice.connect().await.expect("alice connect failed");
    bob.connect().await.expect("bob connect failed");

    alice_transport.add_peer("bob", 2000).await;
    bob_transport.add_peer("alice", 1000).await;

    assert!(
        alice_transport
            .wait_for_call(
                |c| *c == TransportCall::InitiateCall(PeerId::from("bob")),
                DECISION_TIMEOUT_MS
            )
            .await
    );
    tokio::time::sleep(Duration::from_millis(QUIET_PERIOD_MS)).await;

    assert_eq!(alice_transport.calls_to("bob").await, 1);
    assert_eq!(bob_transport.calls_to("alice").await, 0);

    let alice_dials = alice.should_initiate_to(&PeerId::from("bob")).unwrap();
    let bob_dials = bob.should_initiate_to(&PeerId::from("alice")).unwrap();
    assert!(alice_dials ^ bob_dials);
}

#[tokio::test]
async fn test_own_presence_is_ignored() {
    init_tracing();

    let (alice, alice_transport, _alice_rx) = create_default_session("alice", 1000);
    alice.connect().await.expect("connect failed");

    alice_transport.add_peer("alice", 1000).await;
    tokio::time::sleep(Duration::from_millis(QUIET_PERIOD_MS)).await;

    assert!(alice.peers().is_empty());
    assert_eq!(alice_transport.calls_to("alice").await, 0);
}
