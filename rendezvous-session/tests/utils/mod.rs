pub mod mock_time_source;

pub use mock_time_source::*;
pub use mock_transport::*;
pub use session_helpers::*;
