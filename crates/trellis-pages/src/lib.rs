//! Trellis Pages - client router runtime.
//!
//! Runs in the browser (WASM) and natively for tests and server-side
//! previews. The router fetches only the components a navigation
//! invalidates: every navigation computes the ids of the route tree, asks
//! the skip-list cache which of them are still fresh, and sends the rest of
//! the request to the server.
//!
//! ## Modules
//!
//! - [`router`]: navigation, skip list, prefetch, popstate interception
//! - [`error`]: router and fetch errors
//! - [`logging`]: console/tracing logging macros
//!
//! ## Example
//!
//! ```
//! use trellis_pages::router::skip_list;
//! use trellis_urls::{ComponentId, RouteProps, ShouldSkipConfig, component_ids};
//! use std::collections::HashMap;
//!
//! let cached = RouteProps::new("/a").with_param("q", "1");
//! let cache: HashMap<_, _> = component_ids("/a").into_iter().map(|id| (id, cached.clone())).collect();
//! let policies = HashMap::from([(ComponentId::root(), ShouldSkipConfig::always())]);
//!
//! let next = RouteProps::new("/a").with_param("q", "2");
//! let skip = skip_list(&component_ids("/a"), &next, &cache, &policies);
//! assert_eq!(skip, [ComponentId::root()]);
//! ```

#![warn(missing_docs)]

#[macro_use]
pub mod logging;

pub mod error;
pub mod router;

pub use error::{FetchError, RouterError, RouterResult};
pub use router::{ClientRouter, History, MemoryHistory, NavigationOutcome, RscFetcher, WirePayload};

#[doc(hidden)]
pub mod __private {
	pub use tracing;
	#[cfg(target_arch = "wasm32")]
	pub use web_sys;
}
