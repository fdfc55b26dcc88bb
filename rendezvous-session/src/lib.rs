//! Session bootstrap for a signaling-client adapter: clock offset
//! estimation, join-time based call initiation and local media hand-off.

mod clock;
mod coordinator;
mod error;
mod media;
mod transport;

pub use clock::*;
pub use coordinator::*;
pub use error::{ProbeError, SessionError};
pub use media::*;
pub use transport::*;
