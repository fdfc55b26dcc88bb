use rendezvous_core::PeerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("time probe request failed: {0}")]
    Request(String),

    #[error("time probe response carried no Date header")]
    MissingDateHeader,

    #[error("time probe response carried an unparseable Date header: {0}")]
    InvalidDateHeader(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("failed to join session: {0}")]
    Join(String),

    #[error("call to {peer_id} failed: {reason}")]
    CallInitiation { peer_id: PeerId, reason: String },

    #[error("invalid session state: {0}")]
    State(String),

    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("media for {0} will never arrive")]
    MediaUnavailable(PeerId),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
