use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds on the shared reference clock, as stamped by the transport
/// when a participant entered the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinTime(i64);

impl JoinTime {
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

impl From<i64> for JoinTime {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl fmt::Display for JoinTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
