//! Server-side route registry and resolution.
//!
//! Available with the `server` feature.

pub use trellis_routes::*;
