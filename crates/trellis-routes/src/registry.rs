//! Route registration.
//!
//! A [`Registry`] accepts typed descriptors, validates each one as it is
//! registered and finally builds the immutable [`RouteTable`].
//!
//! ```
//! use trellis_routes::{PageDescriptor, Registry, RenderMode};
//!
//! let mut registry = Registry::new();
//! registry
//! 	.register_page(PageDescriptor::new("/foo", "Foo").render(RenderMode::Static))?
//! 	.register_page(PageDescriptor::new("/foo/[id]", "FooItem"))?;
//! let table = registry.build()?;
//!
//! let matched = table.match_route("/foo/123").unwrap();
//! assert_eq!(matched.params.get_one("id"), Some("123"));
//! # Ok::<(), trellis_routes::RegistryError>(())
//! ```

use crate::api::parse_method;
use crate::descriptor::{
	ApiDescriptor, LayoutDescriptor, PageDescriptor, PagePartDescriptor, RootDescriptor,
	SliceDescriptor,
};
use crate::error::{RegistryError, RegistryResult};
use crate::item::{ComponentRef, RenderMode, RouteItem, RouteKind, expand_static_path};
use crate::layout_trie::LayoutTrie;
use crate::table::{PageEntry, Redirect, RouteTable};
use std::collections::{BTreeSet, HashMap, HashSet};
use trellis_urls::codec::encode_slice_id;
use trellis_urls::pattern::StructuralKey;
use trellis_urls::{CompiledPattern, PathSpec};

/// Reserved prop name injected by the runtime into every page.
const RESERVED_PARAM: &str = "path";

/// Accumulates route descriptors.
#[derive(Debug, Default)]
pub struct Registry {
	root: Option<RouteItem>,
	pages: Vec<PageEntry>,
	page_slots: HashMap<StructuralKey, usize>,
	part_orders: HashSet<(StructuralKey, u32)>,
	layouts: Vec<RouteItem>,
	layout_keys: HashSet<StructuralKey>,
	apis: Vec<RouteItem>,
	api_keys: HashSet<StructuralKey>,
	slices: Vec<RouteItem>,
	slice_index: HashMap<String, usize>,
	redirects: Vec<Redirect>,
	redirect_keys: HashSet<StructuralKey>,
	seq: usize,
}

impl Registry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a page.
	///
	/// # Errors
	///
	/// Fails on an invalid or duplicate path, a `[path]` segment, a path
	/// already used by page parts, or a static page with dynamic segments and
	/// unusable static paths.
	pub fn register_page(&mut self, page: PageDescriptor) -> RegistryResult<&mut Self> {
		let spec = if page.exact_path {
			PathSpec::parse_exact(&page.path)
		} else {
			PathSpec::parse(&page.path)
		}
		.map_err(|source| RegistryError::InvalidPath {
			path: page.path.clone(),
			source,
		})?;
		check_reserved(&spec)?;

		let key = spec.structural_key();
		match self.page_slots.get(&key).map(|&slot| &self.pages[slot]) {
			Some(PageEntry::Page(_)) => {
				return Err(RegistryError::Duplicate {
					kind: RouteKind::Page.as_str(),
					path: spec.to_string(),
				});
			}
			Some(PageEntry::Parts(_)) => {
				return Err(RegistryError::PageConflict(spec.to_string()));
			}
			None => {}
		}

		let mut item = self.new_item(spec, RouteKind::Page, page.component)?;
		item.render = page.render;
		item.get_config = page.get_config;
		item.slices = page.slices;
		item.should_skip = page.should_skip;
		item.static_paths = static_paths_for(&item, page.render, &page.static_paths)?;

		tracing::debug!(path = %item.path(), "registered page");
		self.page_slots.insert(key, self.pages.len());
		self.pages.push(PageEntry::Page(item));
		Ok(self)
	}

	/// Registers a layout.
	///
	/// Layouts may use static and dynamic segments only. Wildcard layouts are
	/// not supported: a catch-all belongs to the page, and the layouts above
	/// it are matched by prefix.
	///
	/// # Errors
	///
	/// Fails on an invalid or duplicate path, and with
	/// [`RegistryError::WildcardLayout`] when any segment is a wildcard.
	pub fn register_layout(&mut self, layout: LayoutDescriptor) -> RegistryResult<&mut Self> {
		let spec = parse(&layout.path)?;
		if spec.has_wildcard() {
			return Err(RegistryError::WildcardLayout(spec.to_string()));
		}
		if !self.layout_keys.insert(spec.structural_key()) {
			return Err(RegistryError::Duplicate {
				kind: RouteKind::Layout.as_str(),
				path: spec.to_string(),
			});
		}

		let mut item = self.new_item(spec, RouteKind::Layout, layout.component)?;
		item.render = Some(layout.render);
		item.should_skip = layout.should_skip;

		tracing::debug!(path = %item.path(), "registered layout");
		self.layouts.push(item);
		Ok(self)
	}

	/// Registers the root shell.
	///
	/// # Errors
	///
	/// Fails if a root is already registered.
	pub fn register_root(&mut self, root: RootDescriptor) -> RegistryResult<&mut Self> {
		if self.root.is_some() {
			return Err(RegistryError::Duplicate {
				kind: RouteKind::Root.as_str(),
				path: "/".to_string(),
			});
		}
		let mut item = self.new_item(
			PathSpec::from_segments(Vec::new()),
			RouteKind::Root,
			root.component,
		)?;
		item.render = Some(root.render);
		item.should_skip = root.should_skip;
		self.root = Some(item);
		Ok(self)
	}

	/// Registers an API endpoint.
	///
	/// Method keys that are not standard HTTP methods are dropped with a
	/// warning.
	///
	/// # Errors
	///
	/// Fails on an invalid or duplicate path, a declaration that is not
	/// exactly one of the single-method or map forms, or one left without any
	/// usable method.
	pub fn register_api(&mut self, api: ApiDescriptor) -> RegistryResult<&mut Self> {
		let spec = parse(&api.path)?;
		let malformed = |message: &str| RegistryError::MalformedApi {
			path: api.path.clone(),
			message: message.to_string(),
		};

		let entries = match (api.method, api.handler, api.handlers) {
			(Some(method), Some(handler), None) => vec![(method, handler)],
			(None, None, Some(handlers)) => handlers,
			(Some(_), Some(_), Some(_)) => {
				return Err(malformed("both `method` + `handler` and `handlers` given"));
			}
			(None, None, None) => {
				return Err(malformed("either `method` + `handler` or `handlers` is required"));
			}
			_ => return Err(malformed("`method` and `handler` must be given together")),
		};

		if self.api_keys.contains(&spec.structural_key()) {
			return Err(RegistryError::Duplicate {
				kind: RouteKind::Api.as_str(),
				path: spec.to_string(),
			});
		}

		let mut item = self.new_item(spec, RouteKind::Api, ComponentRef::new(&api.path))?;
		item.render = Some(api.render);
		for (key, handler) in entries {
			match parse_method(&key) {
				Some(method) => item.method_handlers.insert(method, handler),
				None => {
					tracing::warn!(path = %item.path(), method = %key, "dropping unknown API method");
				}
			}
		}
		if item.method_handlers.is_empty() {
			return Err(malformed("no valid HTTP method"));
		}
		item.static_paths = static_paths_for(&item, Some(api.render), &api.static_paths)?;

		self.api_keys.insert(item.path().structural_key());
		self.apis.push(item);
		Ok(self)
	}

	/// Registers a slice.
	///
	/// # Errors
	///
	/// Fails on a duplicate or unencodable slice id.
	pub fn register_slice(&mut self, slice: SliceDescriptor) -> RegistryResult<&mut Self> {
		encode_slice_id(&slice.id)?;
		if self.slice_index.contains_key(&slice.id) {
			return Err(RegistryError::Duplicate {
				kind: RouteKind::Slice.as_str(),
				path: slice.id,
			});
		}

		let mut item = self.new_item(
			PathSpec::from_segments(Vec::new()),
			RouteKind::Slice,
			slice.component,
		)?;
		item.render = Some(slice.render);
		item.should_skip = slice.should_skip;
		item.slice_id = Some(slice.id.clone());

		self.slice_index.insert(slice.id, self.slices.len());
		self.slices.push(item);
		Ok(self)
	}

	/// Registers one part of a page.
	///
	/// Parts sharing a path form one page; they are composited by order.
	///
	/// # Errors
	///
	/// Fails on an invalid path, a `[path]` segment, a duplicate order, a
	/// path already used by a page, or unusable static paths.
	pub fn register_page_part(&mut self, part: PagePartDescriptor) -> RegistryResult<&mut Self> {
		let spec = parse(&part.path)?;
		check_reserved(&spec)?;

		let key = spec.structural_key();
		if matches!(
			self.page_slots.get(&key).map(|&slot| &self.pages[slot]),
			Some(PageEntry::Page(_))
		) {
			return Err(RegistryError::PageConflict(spec.to_string()));
		}
		if !self.part_orders.insert((key.clone(), part.order)) {
			return Err(RegistryError::Duplicate {
				kind: RouteKind::PagePart.as_str(),
				path: format!("{} (order {})", spec, part.order),
			});
		}

		let mut item = self.new_item(spec, RouteKind::PagePart, part.component)?;
		item.render = Some(part.render);
		item.order = part.order;
		item.should_skip = part.should_skip;
		item.static_paths = static_paths_for(&item, Some(part.render), &part.static_paths)?;

		match self.page_slots.get(&key) {
			Some(&slot) => {
				if let PageEntry::Parts(parts) = &mut self.pages[slot] {
					parts.push(item);
				}
			}
			None => {
				self.page_slots.insert(key, self.pages.len());
				self.pages.push(PageEntry::Parts(vec![item]));
			}
		}
		Ok(self)
	}

	/// Registers a redirect from one path template to another.
	///
	/// Parameters captured by `from` fill the segments of `to`.
	///
	/// # Errors
	///
	/// Fails on invalid templates, a duplicate source, or a target binding a
	/// name the source does not capture.
	pub fn register_redirect(&mut self, from: &str, to: &str) -> RegistryResult<&mut Self> {
		let from = compile(parse(from)?)?;
		let to = compile(parse(to)?)?;
		if let Some(name) = to
			.spec()
			.param_names()
			.into_iter()
			.find(|name| !from.spec().binds(name))
		{
			return Err(RegistryError::UnboundRedirectParam {
				name: name.to_string(),
				from: from.spec().to_string(),
				to: to.spec().to_string(),
			});
		}
		if !self.redirect_keys.insert(from.spec().structural_key()) {
			return Err(RegistryError::Duplicate {
				kind: "redirect",
				path: from.spec().to_string(),
			});
		}
		self.redirects.push(Redirect { from, to });
		Ok(self)
	}

	/// Validates cross-item references and builds the route table.
	///
	/// # Errors
	///
	/// Fails if a page references an unregistered slice.
	pub fn build(self) -> RegistryResult<RouteTable> {
		for entry in &self.pages {
			if let PageEntry::Page(page) = entry {
				if let Some(missing) = page
					.slices()
					.iter()
					.find(|id| !self.slice_index.contains_key(id.as_str()))
				{
					return Err(RegistryError::UnknownSlice {
						page: page.path().to_string(),
						slice: missing.clone(),
					});
				}
			}
		}

		let pages = self
			.pages
			.into_iter()
			.map(|entry| match entry {
				PageEntry::Parts(mut parts) => {
					parts.sort_by_key(RouteItem::order);
					PageEntry::Parts(parts)
				}
				page => page,
			})
			.collect::<Vec<_>>();

		let mut layouts = LayoutTrie::new();
		for layout in self.layouts {
			layouts.insert(layout);
		}

		tracing::debug!(
			pages = pages.len(),
			layouts = layouts.len(),
			apis = self.apis.len(),
			slices = self.slices.len(),
			"built route table"
		);

		Ok(RouteTable {
			root: self.root,
			pages,
			layouts,
			apis: self.apis,
			slices: self.slices,
			slice_index: self.slice_index,
			redirects: self.redirects,
		})
	}

	fn new_item(
		&mut self,
		spec: PathSpec,
		kind: RouteKind,
		component: ComponentRef,
	) -> RegistryResult<RouteItem> {
		let mut item = RouteItem::new(compile(spec)?, kind, component);
		item.seq = self.seq;
		self.seq += 1;
		Ok(item)
	}
}

fn parse(template: &str) -> RegistryResult<PathSpec> {
	PathSpec::parse(template).map_err(|source| RegistryError::InvalidPath {
		path: template.to_string(),
		source,
	})
}

fn compile(spec: PathSpec) -> RegistryResult<CompiledPattern> {
	let path = spec.to_string();
	CompiledPattern::new(spec).map_err(|source| RegistryError::InvalidPath { path, source })
}

fn check_reserved(spec: &PathSpec) -> RegistryResult<()> {
	let literal_path = spec.is_exact()
		&& spec
			.segments()
			.iter()
			.any(|s| s.name() == format!("[{}]", RESERVED_PARAM));
	if spec.binds(RESERVED_PARAM) || literal_path {
		return Err(RegistryError::ReservedSegment(spec.to_string()));
	}
	Ok(())
}

/// Expands declared static paths for a static item with dynamic segments.
fn static_paths_for(
	item: &RouteItem,
	render: Option<RenderMode>,
	declared: &[Vec<String>],
) -> RegistryResult<BTreeSet<String>> {
	let spec = item.path();
	if spec.is_static() || render != Some(RenderMode::Static) {
		return Ok(BTreeSet::new());
	}
	if declared.is_empty() {
		return Err(RegistryError::MissingStaticPaths(spec.to_string()));
	}
	declared
		.iter()
		.map(|values| {
			expand_static_path(spec, values).ok_or_else(|| RegistryError::InvalidStaticPath {
				path: spec.to_string(),
				values: values.clone(),
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::{ApiRequest, api_handler, response};
	use http::{Method, StatusCode};
	use rstest::rstest;

	fn ok_handler() -> std::sync::Arc<dyn crate::ApiHandler> {
		api_handler(|_req: ApiRequest| async { response(StatusCode::OK, "ok") })
	}

	#[rstest]
	#[case("/foo/[a]", "/foo/[b]")]
	#[case("/x", "/x/")]
	#[case("/[...a]", "/[...b]")]
	fn test_duplicate_page(#[case] first: &str, #[case] second: &str) {
		let mut registry = Registry::new();
		registry.register_page(PageDescriptor::new(first, "A")).unwrap();
		let err = registry
			.register_page(PageDescriptor::new(second, "B"))
			.unwrap_err();
		assert!(matches!(err, RegistryError::Duplicate { kind: "page", .. }));
	}

	#[rstest]
	fn test_same_path_different_kinds_allowed() {
		let mut registry = Registry::new();
		registry
			.register_page(PageDescriptor::new("/a", "Page"))
			.unwrap()
			.register_layout(LayoutDescriptor::new("/a", RenderMode::Static, "Layout"))
			.unwrap()
			.register_api(ApiDescriptor::new("/a").method("GET", ok_handler()))
			.unwrap();
	}

	#[rstest]
	#[case("/[path]")]
	#[case("/docs/[...path]")]
	fn test_reserved_path_segment(#[case] path: &str) {
		let mut registry = Registry::new();
		assert!(matches!(
			registry.register_page(PageDescriptor::new(path, "A")),
			Err(RegistryError::ReservedSegment(_))
		));
	}

	#[rstest]
	fn test_reserved_path_segment_exact() {
		let mut registry = Registry::new();
		assert!(matches!(
			registry.register_page(PageDescriptor::new("/x/[path]", "A").exact()),
			Err(RegistryError::ReservedSegment(_))
		));
	}

	#[rstest]
	fn test_layout_may_bind_path() {
		let mut registry = Registry::new();
		assert!(
			registry
				.register_layout(LayoutDescriptor::new("/[path]", RenderMode::Dynamic, "L"))
				.is_ok()
		);
	}

	#[rstest]
	fn test_api_forms() {
		let mut registry = Registry::new();
		let both = ApiDescriptor::new("/api/a")
			.method("GET", ok_handler())
			.handler("POST", ok_handler());
		assert!(matches!(
			registry.register_api(both),
			Err(RegistryError::MalformedApi { .. })
		));
		assert!(matches!(
			registry.register_api(ApiDescriptor::new("/api/b")),
			Err(RegistryError::MalformedApi { .. })
		));
	}

	#[rstest]
	fn test_api_unknown_methods_dropped() {
		let mut registry = Registry::new();
		registry
			.register_api(
				ApiDescriptor::new("/api/x")
					.handler("get", ok_handler())
					.handler("FROB", ok_handler()),
			)
			.unwrap();
		let table = registry.build().unwrap();
		assert!(table.api_match_for("/api/x", &Method::GET).is_some());
		let item = table.apis().next().unwrap();
		assert_eq!(item.method_handlers().len(), 1);
	}

	#[rstest]
	fn test_api_only_unknown_methods_rejected() {
		let mut registry = Registry::new();
		assert!(matches!(
			registry.register_api(ApiDescriptor::new("/api/x").method("FROB", ok_handler())),
			Err(RegistryError::MalformedApi { .. })
		));
	}

	#[rstest]
	fn test_static_page_with_dynamic_segments() {
		let mut registry = Registry::new();
		assert!(matches!(
			registry.register_page(
				PageDescriptor::new("/blog/[slug]", "Post").render(RenderMode::Static)
			),
			Err(RegistryError::MissingStaticPaths(_))
		));
		assert!(matches!(
			registry.register_page(
				PageDescriptor::new("/blog/[slug]", "Post")
					.render(RenderMode::Static)
					.static_path(["a", "b"])
			),
			Err(RegistryError::InvalidStaticPath { .. })
		));
		registry
			.register_page(
				PageDescriptor::new("/blog/[slug]", "Post")
					.render(RenderMode::Static)
					.static_path(["hello"])
					.static_path(["world"]),
			)
			.unwrap();
		let table = registry.build().unwrap();
		assert!(table.match_route("/blog/hello").is_some());
		assert!(table.match_route("/blog/other").is_none());
		assert_eq!(table.static_paths(), ["/blog/hello", "/blog/world"]);
	}

	#[rstest]
	#[case("/[...x]")]
	#[case("/docs/[...rest]")]
	fn test_wildcard_layout_rejected(#[case] path: &str) {
		let mut registry = Registry::new();
		assert!(matches!(
			registry.register_layout(LayoutDescriptor::new(path, RenderMode::Static, "L")),
			Err(RegistryError::WildcardLayout(_))
		));
	}

	#[rstest]
	fn test_second_root_rejected() {
		let mut registry = Registry::new();
		registry
			.register_root(RootDescriptor::new(RenderMode::Static, "Root"))
			.unwrap();
		assert!(matches!(
			registry.register_root(RootDescriptor::new(RenderMode::Static, "Root2")),
			Err(RegistryError::Duplicate { kind: "root", .. })
		));
	}

	#[rstest]
	fn test_page_and_parts_conflict() {
		let mut registry = Registry::new();
		registry
			.register_page_part(PagePartDescriptor::new("/p", RenderMode::Static, "P0", 0))
			.unwrap();
		assert!(matches!(
			registry.register_page(PageDescriptor::new("/p", "Page")),
			Err(RegistryError::PageConflict(_))
		));
		assert!(matches!(
			registry.register_page_part(PagePartDescriptor::new("/p", RenderMode::Static, "P", 0)),
			Err(RegistryError::Duplicate { .. })
		));

		let mut registry = Registry::new();
		registry
			.register_page(PageDescriptor::new("/q", "Page"))
			.unwrap();
		assert!(matches!(
			registry.register_page_part(PagePartDescriptor::new("/q", RenderMode::Static, "P", 0)),
			Err(RegistryError::PageConflict(_))
		));
	}

	#[rstest]
	fn test_unknown_slice_rejected_at_build() {
		let mut registry = Registry::new();
		registry
			.register_page(PageDescriptor::new("/", "Home").slices(["cart"]))
			.unwrap();
		assert!(matches!(
			registry.build(),
			Err(RegistryError::UnknownSlice { .. })
		));
	}

	#[rstest]
	fn test_duplicate_slice() {
		let mut registry = Registry::new();
		registry
			.register_slice(SliceDescriptor::new("cart", RenderMode::Dynamic, "Cart"))
			.unwrap();
		assert!(matches!(
			registry.register_slice(SliceDescriptor::new("cart", RenderMode::Dynamic, "Cart")),
			Err(RegistryError::Duplicate { kind: "slice", .. })
		));
		assert!(matches!(
			registry.register_slice(SliceDescriptor::new("", RenderMode::Dynamic, "Empty")),
			Err(RegistryError::InvalidSliceId(_))
		));
	}

	#[rstest]
	fn test_redirect_params_must_be_captured() {
		let mut registry = Registry::new();
		assert!(registry.register_redirect("/old/[id]", "/new/[id]").is_ok());
		assert!(matches!(
			registry.register_redirect("/gone", "/new/[id]"),
			Err(RegistryError::UnboundRedirectParam { .. })
		));
		assert!(matches!(
			registry.register_redirect("/old/[x]", "/elsewhere"),
			Err(RegistryError::Duplicate { kind: "redirect", .. })
		));
	}
}
