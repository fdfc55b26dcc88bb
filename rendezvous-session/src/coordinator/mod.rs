mod coordinator;
mod session_config;
mod session_event;
mod session_phase;

pub use coordinator::*;
pub use session_config::*;
pub use session_event::*;
pub use session_phase::*;
