mod stream_registry;

pub use stream_registry::*;
