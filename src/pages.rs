//! Client-side router runtime.
//!
//! Available with the `pages` feature. On `wasm32` the router drives
//! `window.history` through `router::BrowserHistory`; elsewhere use
//! [`router::MemoryHistory`].

pub use trellis_pages::*;
