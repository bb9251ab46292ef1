//! Error types for route registration and rendering.

use thiserror::Error;
use trellis_urls::{CodecError, PatternError, SkipHeaderError};

/// Errors raised while registering routes or building the route table.
///
/// All of these are fatal: a registry that fails to build is a programming
/// error in the application's route declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	/// The path template could not be parsed.
	#[error("Invalid path '{path}': {source}")]
	InvalidPath {
		/// The offending template.
		path: String,
		/// Why it was rejected.
		#[source]
		source: PatternError,
	},

	/// Two items of the same kind share a structurally identical path.
	#[error("Duplicate {kind} registration: {path}")]
	Duplicate {
		/// Kind of the clashing items.
		kind: &'static str,
		/// Path (or slice id) registered twice.
		path: String,
	},

	/// A page path binds the reserved `path` parameter.
	#[error("Page path must not contain a `[path]` segment: {0}")]
	ReservedSegment(String),

	/// An API declaration that is not exactly one of `method + handler` or `handlers`.
	#[error("Malformed API declaration for {path}: {message}")]
	MalformedApi {
		/// API path.
		path: String,
		/// What is wrong with the declaration.
		message: String,
	},

	/// A static item with dynamic segments and no static paths.
	#[error("Static route with dynamic segments requires static paths: {0}")]
	MissingStaticPaths(String),

	/// A static path that does not fit the item's segments.
	#[error("Static path {values:?} does not fit {path}")]
	InvalidStaticPath {
		/// Item path.
		path: String,
		/// The rejected values.
		values: Vec<String>,
	},

	/// A layout path with a wildcard segment.
	#[error("Layout path must not contain a wildcard: {0}")]
	WildcardLayout(String),

	/// A path registered both as a page and as page parts.
	#[error("Path is registered both as a page and as page parts: {0}")]
	PageConflict(String),

	/// A page references a slice that was never registered.
	#[error("Page {page} references unknown slice '{slice}'")]
	UnknownSlice {
		/// The referencing page.
		page: String,
		/// The missing slice id.
		slice: String,
	},

	/// A redirect target binding a name its source does not capture.
	#[error("Redirect target {to} binds `{name}`, which {from} does not capture")]
	UnboundRedirectParam {
		/// The unbound name.
		name: String,
		/// Source template.
		from: String,
		/// Target template.
		to: String,
	},

	/// A slice id that cannot be encoded.
	#[error("Invalid slice id: {0}")]
	InvalidSliceId(#[from] CodecError),
}

/// Errors raised by the render collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
	/// The component failed to render.
	#[error("Render failed for {component}: {message}")]
	Failed {
		/// Component reference.
		component: String,
		/// Failure reported by the renderer.
		message: String,
	},
}

/// Errors raised while resolving a wire request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
	/// The wire path could not be decoded.
	#[error(transparent)]
	Codec(#[from] CodecError),

	/// The skip header could not be parsed.
	#[error(transparent)]
	SkipHeader(#[from] SkipHeaderError),

	/// The wire path names a target the resolver does not serve.
	#[error("Unsupported wire target: {0}")]
	UnsupportedTarget(String),
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
