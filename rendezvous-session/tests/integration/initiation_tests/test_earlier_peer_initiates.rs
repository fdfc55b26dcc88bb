use rendezvous_core::{ConnectStatus, PeerId};
use rendezvous_session::{SessionError, SessionEvent};

use crate::integration::init_tracing;
use crate::utils::{
    DECISION_TIMEOUT_MS, TransportCall, create_default_session, wait_for_session_event,
};

#[tokio::test]
async fn test_earlier_peer_initiates() {
    init_tracing();

    let (coordinator, transport, mut session_rx) = create_default_session("alice", 1000);
    coordinator.connect().await.expect("connect failed");

    transport.add_peer("bob", 2000).await;

    let bob = PeerId::from("bob");
    assert!(
        transport
            .wait_for_call(
                |c| *c == TransportCall::InitiateCall(bob.clone()),
                DECISION_TIMEOUT_MS
            )
            .await,
        "alice joined first and should dial bob"
    );

    let opened = wait_for_session_event(
        &mut session_rx,
        |e| matches!(e, SessionEvent::PeerOpened(_)),
        DECISION_TIMEOUT_MS,
    )
    .await;
    assert_eq!(opened, Some(SessionEvent::PeerOpened(bob.clone())));

    assert!(coordinator.should_initiate_to(&bob).unwrap());
    assert_eq!(transport.calls_to("bob").await, 1);
}

#[tokio::test]
async fn test_accepted_call_marks_peer_connected() {
    init_tracing();

    let (coordinator, transport, _session_rx) = create_default_session("alice", 1000);
    coordinator.connect().await.expect("connect failed");

    transport.add_peer("bob", 2000).await;

    let bob = PeerId::from("bob");
    let start = std::time::Instant::now();
    while coordinator.peer(&bob).map(|r| r.state) != Some(ConnectStatus::Connected) {
        assert!(
            start.elapsed().as_millis() < DECISION_TIMEOUT_MS as u128,
            "bob never reached Connected"
        );
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_peers_seen_before_connect_are_decided_once_ready() {
    init_tracing();

    let (coordinator, transport, mut session_rx) = create_default_session("alice", 1000);

    transport.add_peer("bob", 2000).await;
    transport.add_peer("carol", 500).await;

    let occupants = wait_for_session_event(
        &mut session_rx,
        |e| matches!(e, SessionEvent::Occupants(list) if list.len() == 2),
        DECISION_TIMEOUT_MS,
    )
    .await;
    assert!(occupants.is_some());

    assert!(matches!(
        coordinator.should_initiate_to(&PeerId::from("bob")),
        Err(SessionError::State(_))
    ));
    assert!(transport.calls().await.is_empty());

    coordinator.connect().await.expect("connect failed");

    assert!(
        transport
            .wait_for_call(
                |c| *c == TransportCall::InitiateCall(PeerId::from("bob")),
                DECISION_TIMEOUT_MS
            )
            .await
    );
    assert_eq!(transport.calls_to("carol").await, 0);
    assert_eq!(transport.calls_to("bob").await, 1);
}

#[tokio::test]
async fn test_equal_join_times_initiate() {
    init_tracing();

    let (coordinator, transport, _session_rx) = create_default_session("alice", 1500);
    coordinator.connect().await.expect("connect failed");

    transport.add_peer("bob", 1500).await;

    assert!(
        transport
            .wait_for_call(
                |c| *c == TransportCall::InitiateCall(PeerId::from("bob")),
                DECISION_TIMEOUT_MS
            )
            .await
    );
}
