use crate::model::{ConnectStatus, JoinTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque participant identifier assigned by the signaling transport.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random identifier, for transports that let the client pick its own id.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A remote participant as reported by the transport's presence notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub peer_id: PeerId,
    pub room_join_time: JoinTime,
    #[serde(default)]
    pub state: ConnectStatus,
}

impl PeerRecord {
    pub fn new(peer_id: impl Into<PeerId>, room_join_time: impl Into<JoinTime>) -> Self {
        Self {
            peer_id: peer_id.into(),
            room_join_time: room_join_time.into(),
            state: ConnectStatus::NotConnected,
        }
    }
}
