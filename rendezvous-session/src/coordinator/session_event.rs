use bytes::Bytes;
use rendezvous_core::PeerId;

/// Notifications the coordinator raises for the application.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Current set of remote occupants, sent whenever it changes.
    Occupants(Vec<PeerId>),

    /// This side is about to dial the peer.
    PeerOpened(PeerId),

    /// The peer left the room.
    PeerClosed(PeerId),

    /// Application data relayed by the signaling server.
    Message {
        from: PeerId,
        data_type: String,
        payload: Bytes,
    },

    /// Dialing the peer failed. The session itself is unaffected.
    CallFailed { peer_id: PeerId, reason: String },
}
