mod connect_status;
mod join_time;
mod media;
mod peer;

pub use connect_status::ConnectStatus;
pub use join_time::JoinTime;
pub use media::MediaOptions;
pub use peer::{PeerId, PeerRecord};
