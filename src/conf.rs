//! Router settings.

pub use trellis_conf::*;
