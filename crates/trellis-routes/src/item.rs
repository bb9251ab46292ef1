//! Registered route items.

use crate::api::ApiHandler;
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use trellis_urls::pattern::{PathSegment, normalize_path};
use trellis_urls::{CompiledPattern, PathParams, PathSpec, ShouldSkipConfig};

/// Kind partition of a route item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteKind {
	/// A page rendered at a concrete path.
	Page,
	/// A layout wrapping everything under its path.
	Layout,
	/// The root shell.
	Root,
	/// An API endpoint.
	Api,
	/// One fragment of a page composited by order.
	PagePart,
	/// An independently fetchable subtree.
	Slice,
}

impl RouteKind {
	/// Returns the lowercase name used in messages.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Page => "page",
			Self::Layout => "layout",
			Self::Root => "root",
			Self::Api => "api",
			Self::PagePart => "page part",
			Self::Slice => "slice",
		}
	}
}

impl fmt::Display for RouteKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Whether output may be precomputed once or must be produced per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
	/// Precomputable output.
	Static,
	/// Per-request output.
	#[default]
	Dynamic,
}

impl RenderMode {
	/// Returns `true` for [`RenderMode::Static`].
	pub fn is_static(&self) -> bool {
		matches!(self, Self::Static)
	}
}

/// Opaque reference to a component understood by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRef(Arc<str>);

impl ComponentRef {
	/// Creates a reference from a name.
	pub fn new(name: &str) -> Self {
		Self(Arc::from(name))
	}

	/// Returns the name.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ComponentRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ComponentRef {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

/// Configuration a page may report when its render mode is not declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
	/// Render mode, if the page decides one.
	pub render: Option<RenderMode>,
}

/// Collaborator consulted for a page's configuration at resolution time.
pub trait GetConfig: Send + Sync {
	/// Returns the page configuration.
	fn get_config(&self) -> PageConfig;
}

impl<F> GetConfig for F
where
	F: Fn() -> PageConfig + Send + Sync,
{
	fn get_config(&self) -> PageConfig {
		self()
	}
}

/// API handlers keyed by method.
#[derive(Clone, Default)]
pub struct MethodHandlers(HashMap<Method, Arc<dyn ApiHandler>>);

impl MethodHandlers {
	pub(crate) fn insert(&mut self, method: Method, handler: Arc<dyn ApiHandler>) {
		self.0.insert(method, handler);
	}

	/// Returns the handler for `method`.
	pub fn get(&self, method: &Method) -> Option<&Arc<dyn ApiHandler>> {
		self.0.get(method)
	}

	/// Returns the registered methods, sorted by name.
	pub fn methods(&self) -> Vec<&Method> {
		let mut methods: Vec<&Method> = self.0.keys().collect();
		methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
		methods
	}

	/// Returns the number of registered methods.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if no method is registered.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for MethodHandlers {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.methods()).finish()
	}
}

/// One registered page, layout, root, API, page part or slice.
///
/// Items are created by the [`Registry`](crate::Registry) and never mutated
/// after [`Registry::build`](crate::Registry::build).
#[derive(Clone)]
pub struct RouteItem {
	pub(crate) pattern: CompiledPattern,
	pub(crate) kind: RouteKind,
	pub(crate) render: Option<RenderMode>,
	pub(crate) get_config: Option<Arc<dyn GetConfig>>,
	pub(crate) component: ComponentRef,
	pub(crate) static_paths: BTreeSet<String>,
	pub(crate) method_handlers: MethodHandlers,
	pub(crate) slices: Vec<String>,
	pub(crate) order: u32,
	pub(crate) should_skip: Option<ShouldSkipConfig>,
	pub(crate) slice_id: Option<String>,
	pub(crate) seq: usize,
}

impl RouteItem {
	pub(crate) fn new(pattern: CompiledPattern, kind: RouteKind, component: ComponentRef) -> Self {
		Self {
			pattern,
			kind,
			render: None,
			get_config: None,
			component,
			static_paths: BTreeSet::new(),
			method_handlers: MethodHandlers::default(),
			slices: Vec::new(),
			order: 0,
			should_skip: None,
			slice_id: None,
			seq: 0,
		}
	}

	/// Returns the parsed path.
	pub fn path(&self) -> &PathSpec {
		self.pattern.spec()
	}

	/// Returns the compiled matcher.
	pub fn pattern(&self) -> &CompiledPattern {
		&self.pattern
	}

	/// Returns the kind.
	pub fn kind(&self) -> RouteKind {
		self.kind
	}

	/// Returns the declared render mode, if any.
	pub fn declared_render_mode(&self) -> Option<RenderMode> {
		self.render
	}

	/// Returns the effective render mode.
	///
	/// A declared mode wins, then the mode reported by the configuration
	/// collaborator; anything else renders dynamically.
	pub fn render_mode(&self) -> RenderMode {
		self.render
			.or_else(|| self.get_config.as_ref().and_then(|c| c.get_config().render))
			.unwrap_or_default()
	}

	/// Returns the component reference.
	pub fn component(&self) -> &ComponentRef {
		&self.component
	}

	/// Returns the concrete paths expanded from the declared static paths.
	pub fn static_paths(&self) -> impl Iterator<Item = &str> {
		self.static_paths.iter().map(String::as_str)
	}

	/// Returns the API handlers.
	pub fn method_handlers(&self) -> &MethodHandlers {
		&self.method_handlers
	}

	/// Returns the slice ids a page declares, in order.
	pub fn slices(&self) -> &[String] {
		&self.slices
	}

	/// Returns the composition order of a page part.
	pub fn order(&self) -> u32 {
		self.order
	}

	/// Returns the slice id of a slice item.
	pub fn slice_id(&self) -> Option<&str> {
		self.slice_id.as_deref()
	}

	/// Returns whether the path was declared exact.
	pub fn is_exact(&self) -> bool {
		self.path().is_exact()
	}

	/// Returns the reuse policy sent to clients.
	///
	/// Static items are reusable by default; dynamic items only when they
	/// declare a policy.
	pub fn skip_policy(&self) -> Option<ShouldSkipConfig> {
		match &self.should_skip {
			Some(policy) => Some(policy.clone()),
			None if self.render_mode().is_static() => Some(ShouldSkipConfig::always()),
			None => None,
		}
	}

	/// Matches a concrete path, honoring the static-path restriction.
	pub fn accepts(&self, path: &str) -> Option<PathParams> {
		let params = self.pattern.matches(path)?;
		if !self.static_paths.is_empty() && !self.static_paths.contains(&normalize_path(path)) {
			return None;
		}
		Some(params)
	}

	pub(crate) fn literal_count(&self) -> usize {
		self.path()
			.segments()
			.iter()
			.filter(|s| !s.is_dynamic())
			.count()
	}
}

impl fmt::Debug for RouteItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteItem")
			.field("path", &self.path().to_string())
			.field("kind", &self.kind)
			.field("render", &self.render)
			.field("component", &self.component)
			.field("static_paths", &self.static_paths)
			.field("method_handlers", &self.method_handlers)
			.field("slices", &self.slices)
			.field("order", &self.order)
			.field("should_skip", &self.should_skip)
			.field("slice_id", &self.slice_id)
			.finish()
	}
}

/// Expands one static path entry into a concrete path.
///
/// Groups take one value each; a trailing wildcard takes the rest. Returns
/// `None` when the values do not fit the spec.
pub(crate) fn expand_static_path(spec: &PathSpec, values: &[String]) -> Option<String> {
	if values.iter().any(|v| v.is_empty() || v.contains('/')) {
		return None;
	}
	let mut remaining = values;
	let mut segments: Vec<&str> = Vec::with_capacity(spec.len() + values.len());
	for segment in spec.segments() {
		match segment {
			PathSegment::Literal(text) => segments.push(text),
			PathSegment::Group(_) => {
				let (first, rest) = remaining.split_first()?;
				segments.push(first);
				remaining = rest;
			}
			PathSegment::Wildcard(_) => {
				if remaining.is_empty() && spec.len() > 1 {
					return None;
				}
				segments.extend(remaining.iter().map(String::as_str));
				remaining = &[];
			}
		}
	}
	if !remaining.is_empty() {
		return None;
	}
	Some(normalize_path(&segments.join("/")))
}
