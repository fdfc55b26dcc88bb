use async_trait::async_trait;
use bytes::Bytes;
use rendezvous_core::{ConnectStatus, JoinTime, PeerId};

/// Result of asking a remote peer to accept a direct connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Accepted,
    Rejected,
}

/// Operations the session needs from the underlying signaling client.
///
/// Implementations wrap a concrete signaling library. Presence, media and
/// message notifications are not part of this trait; the implementation
/// pushes them into the `TransportEvent` channel handed to the coordinator.
#[async_trait]
pub trait SignalingTransport: Send + Sync + 'static {
    /// Handle to a captured or received media stream.
    type Media: Clone + Send + Sync + 'static;

    /// Register interest in a room. Takes effect on the next `connect`.
    async fn join_room(&self, room: &str) -> Result<(), String>;

    /// Open the signaling session for `app` and return the assigned client id.
    async fn connect(&self, app: &str) -> Result<PeerId, String>;

    /// Acquire the local capture device.
    async fn init_media_source(&self) -> Result<Self::Media, String>;

    /// Join time the transport recorded for `peer_id` in `room`.
    async fn room_join_time(&self, room: &str, peer_id: &PeerId) -> Option<JoinTime>;

    /// Dial `peer_id` directly.
    async fn initiate_call(&self, peer_id: &PeerId) -> Result<CallOutcome, String>;

    async fn connect_status(&self, peer_id: &PeerId) -> ConnectStatus;

    /// Reliable delivery to one peer over the signaling socket.
    async fn send_data(&self, peer_id: &PeerId, data_type: &str, payload: Bytes)
        -> Result<(), String>;

    /// Reliable delivery to every occupant of `room`.
    async fn broadcast_data(&self, room: &str, data_type: &str, payload: Bytes)
        -> Result<(), String>;

    async fn disconnect(&self);
}
