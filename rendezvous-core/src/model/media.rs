use serde::{Deserialize, Serialize};

/// Media flags forwarded to the signaling client before connecting.
///
/// Video is never negotiated; `audio` toggles both sending and receiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaOptions {
    pub audio: bool,
    pub datachannel: bool,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            audio: false,
            datachannel: true,
        }
    }
}
