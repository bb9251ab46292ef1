//! # Trellis
//!
//! Page routing and request resolution for server-rendered web applications.
//!
//! Routes are declared once as pages, layouts, a root shell, API endpoints,
//! page parts and slices. The server resolves a request to the composed
//! tree of components it renders, each classified as static or dynamic. The
//! client router fetches only the components a navigation invalidates,
//! keyed by deterministic component ids.
//!
//! ## Crates
//!
//! - [`urls`]: path patterns, the route identifier codec, component ids
//! - [`conf`]: router settings
//! - [`routes`] (`server` feature): registry, route table, resolver
//! - [`pages`] (`pages` feature): client router runtime
//!
//! ## Feature Flags
//!
//! - `server` - registry and resolver
//! - `pages` - client router
//! - `full` (default) - both
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "server")]
//! # {
//! use std::sync::Arc;
//! use trellis::prelude::*;
//!
//! let mut registry = Registry::new();
//! registry
//! 	.register_root(RootDescriptor::new(RenderMode::Static, "Shell"))?
//! 	.register_page(PageDescriptor::new("/", "Home").render(RenderMode::Static))?
//! 	.register_page(PageDescriptor::new("/posts/[slug]", "Post"))?;
//! let resolver = Resolver::new(Arc::new(registry.build()?));
//!
//! let Resolution::Route(route) = resolver.resolve_path("/posts/hello", &[]) else {
//! 	panic!("no route");
//! };
//! let ids: Vec<&str> = route.ids().into_iter().map(ComponentId::as_str).collect();
//! assert_eq!(ids, ["root", "posts/hello/page"]);
//! # }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod conf;
#[cfg(feature = "pages")]
pub mod pages;
#[cfg(feature = "server")]
pub mod routes;
pub mod urls;

pub use trellis_conf::{RouterSettings, SettingsError};
pub use trellis_urls::{
	CodecError, ComponentId, PathParams, PathSpec, PatternError, RouteProps, ShouldSkipConfig,
	component_ids, match_path,
};

#[cfg(feature = "server")]
pub use trellis_routes::{
	ApiDescriptor, LayoutDescriptor, PageDescriptor, PagePartDescriptor, Registry, RegistryError,
	RenderMode, Renderer, Resolution, ResolvedRoute, Resolver, RootDescriptor, RouteTable,
	SliceDescriptor,
};

#[cfg(feature = "pages")]
pub use trellis_pages::{ClientRouter, MemoryHistory, NavigationOutcome, RouterError, RscFetcher};

/// Common imports.
pub mod prelude {
	pub use crate::{
		ComponentId, PathParams, RouteProps, RouterSettings, ShouldSkipConfig, component_ids,
		match_path,
	};

	#[cfg(feature = "server")]
	pub use crate::{
		ApiDescriptor, LayoutDescriptor, PageDescriptor, PagePartDescriptor, Registry,
		RenderMode, Renderer, Resolution, ResolvedRoute, Resolver, RootDescriptor,
		SliceDescriptor,
	};
	#[cfg(feature = "server")]
	pub use trellis_routes::{ApiRequest, ApiResponse, api_handler};

	#[cfg(feature = "pages")]
	pub use crate::{ClientRouter, MemoryHistory, NavigationOutcome, RscFetcher};
	#[cfg(feature = "pages")]
	pub use trellis_pages::router::{FetchRequest, FetchResult, LinkActivation, WirePayload};
}
