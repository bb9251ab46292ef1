//! URL-level building blocks shared by the Trellis server and client.
//!
//! - [`pattern`]: bracketed path templates (`/users/[id]/[...rest]`) compiled
//!   to regex matchers
//! - [`codec`]: reversible mapping from route paths, slice ids and server
//!   function ids to wire paths
//! - [`component_id`]: deterministic ids of the nodes of a composed route tree
//! - [`location`]: parsed request/browser locations
//! - [`skip`]: per-component reuse policies and the skip-list header
//!
//! ## Example
//!
//! ```
//! use trellis_urls::{codec, pattern::match_path};
//!
//! let params = match_path("/foo/[x]/[y]", "/foo/bar/baz").unwrap().unwrap();
//! assert_eq!(params.get_one("x"), Some("bar"));
//!
//! let rsc_path = codec::encode_route_path("/foo/bar").unwrap();
//! assert_eq!(codec::decode_route_path(&rsc_path).unwrap(), "/foo/bar");
//! ```

pub mod codec;
pub mod component_id;
pub mod error;
pub mod location;
pub mod pattern;
pub mod skip;

pub use component_id::{ComponentId, component_ids};
pub use error::{CodecError, LocationError, PatternError, SkipHeaderError};
pub use location::{RouteProps, SearchParams};
pub use pattern::{
	CompiledPattern, ParamValue, PathParams, PathSegment, PathSpec, match_path,
	parse_exact_path_spec, parse_path_spec,
};
pub use skip::{SKIP_HEADER, ShouldSkipConfig};
