//! Route registry and server-side resolution for Trellis.
//!
//! Routes are declared on a [`Registry`] with typed descriptors and built
//! into an immutable [`RouteTable`]. A [`Resolver`] turns a request into a
//! [`Resolution`]: an API handler, a redirect, the composed entries of a
//! page, or a not-found signal.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_routes::{PageDescriptor, Registry, RenderMode, Resolution, Resolver};
//!
//! let mut registry = Registry::new();
//! registry
//! 	.register_page(PageDescriptor::new("/foo", "Foo").render(RenderMode::Static))?
//! 	.register_page(PageDescriptor::new("/foo/[id]", "FooItem").render(RenderMode::Dynamic))?;
//! let resolver = Resolver::new(Arc::new(registry.build()?));
//!
//! match resolver.resolve_path("/foo/123", &[]) {
//! 	Resolution::Route(route) => {
//! 		assert_eq!(route.render_mode, RenderMode::Dynamic);
//! 		assert_eq!(route.params.get_one("id"), Some("123"));
//! 	}
//! 	other => panic!("unexpected: {:?}", other),
//! }
//! # Ok::<(), trellis_routes::RegistryError>(())
//! ```

pub mod api;
pub mod descriptor;
pub mod error;
pub mod item;
pub mod layout_trie;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod table;

pub use api::{ApiHandler, ApiRequest, ApiResponse, api_handler};
pub use descriptor::{
	ApiDescriptor, LayoutDescriptor, PageDescriptor, PagePartDescriptor, RootDescriptor,
	SliceDescriptor,
};
pub use error::{RegistryError, RegistryResult, RenderError, ResolveError};
pub use item::{ComponentRef, GetConfig, PageConfig, RenderMode, RouteItem, RouteKind};
pub use registry::Registry;
pub use render::{RenderedEntry, Renderer, render_route};
pub use resolver::{Resolution, ResolvedEntry, ResolvedRoute, Resolver};
pub use table::{ApiMatch, ChainLink, PageMatch, RouteMatch, RouteTable};
