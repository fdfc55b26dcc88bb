use bytes::Bytes;
use rendezvous_core::{ConnectStatus, PeerId, PeerRecord};

/// Notifications the signaling transport pushes to the coordinator.
#[derive(Debug)]
pub enum TransportEvent<M> {
    /// A peer is present in the room, with its transport-assigned join time.
    PeerJoined(PeerRecord),

    /// The peer left the room.
    PeerLeft(PeerId),

    /// The transport observed a new direct-connection state for the peer.
    StateChanged(PeerId, ConnectStatus),

    /// A media stream for the peer became available.
    StreamAvailable(PeerId, M),

    /// The peer's media stream was closed.
    StreamClosed(PeerId),

    /// Application data relayed by the signaling server.
    Message {
        from: PeerId,
        data_type: String,
        payload: Bytes,
    },
}
