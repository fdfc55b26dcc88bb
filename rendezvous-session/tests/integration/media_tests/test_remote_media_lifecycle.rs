use rendezvous_core::PeerId;
use rendezvous_session::TransportEvent;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{DECISION_TIMEOUT_MS, create_default_session};

#[tokio::test]
async fn test_request_before_stream_arrives() {
    init_tracing();

    let (coordinator, transport, _session_rx) = create_default_session("alice", 1000);
    coordinator.connect().await.expect("connect failed");

    let bob = PeerId::from("bob");
    let request = coordinator.request_media(&bob);
    assert_eq!(coordinator.streams().pending(&bob), 1);

    transport
        .push(TransportEvent::StreamAvailable(bob.clone(), "bob-audio-1".to_owned()))
        .await;

    let stream = tokio::time::timeout(Duration::from_millis(DECISION_TIMEOUT_MS), request)
        .await
        .expect("media never delivered")
        .unwrap();
    assert_eq!(stream, "bob-audio-1");
    assert_eq!(coordinator.streams().pending(&bob), 0);
}

#[tokio::test]
async fn test_closed_stream_is_replaced() {
    init_tracing();

    let (coordinator, transport, _session_rx) = create_default_session("alice", 1000);
    let bob = PeerId::from("bob");

    transport
        .push(TransportEvent::StreamAvailable(bob.clone(), "first".to_owned()))
        .await;
    let first = tokio::time::timeout(
        Duration::from_millis(DECISION_TIMEOUT_MS),
        coordinator.request_media(&bob),
    )
    .await
    .expect("first stream never delivered")
    .unwrap();
    assert_eq!(first, "first");

    transport.push(TransportEvent::StreamClosed(bob.clone())).await;

    let start = std::time::Instant::now();
    while coordinator.streams().contains(&bob) {
        assert!(start.elapsed() < Duration::from_millis(DECISION_TIMEOUT_MS));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let second = coordinator.request_media(&bob);
    transport
        .push(TransportEvent::StreamAvailable(bob.clone(), "second".to_owned()))
        .await;

    let second = tokio::time::timeout(Duration::from_millis(DECISION_TIMEOUT_MS), second)
        .await
        .expect("second stream never delivered")
        .unwrap();
    assert_eq!(second, "second");
}
