mod clock_offset_estimator;
mod http_time_source;
mod local_clock;
mod offset_window;
mod time_source;

pub use clock_offset_estimator::*;
pub use http_time_source::*;
pub use local_clock::*;
pub use offset_window::*;
pub use time_source::*;
