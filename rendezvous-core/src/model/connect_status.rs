use serde::{Deserialize, Serialize};

/// Direct-connection state of a remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectStatus {
    #[default]
    NotConnected,
    Connecting,
    Connected,
}

impl ConnectStatus {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectStatus::Connected)
    }
}
