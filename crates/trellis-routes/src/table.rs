//! The immutable route table produced by [`Registry::build`](crate::Registry::build).

use crate::api::ApiHandler;
use crate::item::{RenderMode, RouteItem};
use crate::layout_trie::LayoutTrie;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use trellis_urls::component_id::NOT_FOUND_PATH;
use trellis_urls::pattern::{normalize_path, split_path};
use trellis_urls::{CompiledPattern, ComponentId, PathParams};

/// A page slot: either one page or the ordered parts of a page.
#[derive(Debug, Clone)]
pub(crate) enum PageEntry {
	Page(RouteItem),
	Parts(Vec<RouteItem>),
}

impl PageEntry {
	fn accepts(&self, path: &str) -> Option<PathParams> {
		match self {
			Self::Page(item) => item.accepts(path),
			Self::Parts(parts) => {
				let (first, rest) = parts.split_first()?;
				let params = first.accepts(path)?;
				rest.iter()
					.all(|part| part.accepts(path).is_some())
					.then_some(params)
			}
		}
	}

	fn first(&self) -> Option<&RouteItem> {
		match self {
			Self::Page(item) => Some(item),
			Self::Parts(parts) => parts.first(),
		}
	}
}

/// The page side of a [`RouteMatch`].
#[derive(Debug, Clone, Copy)]
pub enum PageMatch<'a> {
	/// A single page.
	Page(&'a RouteItem),
	/// Page parts sorted by order.
	Parts(&'a [RouteItem]),
}

impl<'a> PageMatch<'a> {
	/// Returns the page, or the first part.
	pub fn primary(&self) -> Option<&'a RouteItem> {
		match self {
			Self::Page(item) => Some(item),
			Self::Parts(parts) => parts.first(),
		}
	}

	/// Returns the effective render mode; parts are static only if all are.
	pub fn render_mode(&self) -> RenderMode {
		match self {
			Self::Page(item) => item.render_mode(),
			Self::Parts(parts) if parts.iter().all(|p| p.render_mode().is_static()) => {
				RenderMode::Static
			}
			Self::Parts(_) => RenderMode::Dynamic,
		}
	}

	/// Returns the slice ids the page renders.
	pub fn slices(&self) -> &'a [String] {
		match self {
			Self::Page(item) => item.slices(),
			Self::Parts(_) => &[],
		}
	}

	/// Returns whether the path was declared exact.
	pub fn is_exact(&self) -> bool {
		self.primary().is_some_and(RouteItem::is_exact)
	}
}

/// A successful page match.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
	/// Normalized concrete path.
	pub path: String,
	/// Captured parameters.
	pub params: PathParams,
	/// The matched page or page parts.
	pub page: PageMatch<'a>,
}

/// One layer of the composition wrapping a page.
#[derive(Debug, Clone)]
pub struct ChainLink<'a> {
	/// The root or layout item.
	pub item: &'a RouteItem,
	/// Component id of this layer for the concrete path.
	pub id: ComponentId,
	/// Parameters the layout path captured from its prefix.
	pub params: PathParams,
}

/// A successful API match.
#[derive(Clone)]
pub struct ApiMatch {
	/// Template of the matched endpoint.
	pub path: String,
	/// Request method.
	pub method: Method,
	/// Captured parameters.
	pub params: PathParams,
	/// Handler for the method.
	pub handler: Arc<dyn ApiHandler>,
}

impl std::fmt::Debug for ApiMatch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ApiMatch")
			.field("path", &self.path)
			.field("method", &self.method)
			.field("params", &self.params)
			.finish_non_exhaustive()
	}
}

/// A registered redirect.
#[derive(Debug, Clone)]
pub(crate) struct Redirect {
	pub(crate) from: CompiledPattern,
	pub(crate) to: CompiledPattern,
}

/// Resolved, queryable routes.
///
/// The table is immutable and can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
	pub(crate) root: Option<RouteItem>,
	pub(crate) pages: Vec<PageEntry>,
	pub(crate) layouts: LayoutTrie,
	pub(crate) apis: Vec<RouteItem>,
	pub(crate) slices: Vec<RouteItem>,
	pub(crate) slice_index: HashMap<String, usize>,
	pub(crate) redirects: Vec<Redirect>,
}

impl RouteTable {
	/// Matches a page, testing pages in registration order.
	pub fn match_route(&self, path: &str) -> Option<RouteMatch<'_>> {
		let path = normalize_path(path);
		self.pages.iter().find_map(|entry| {
			let params = entry.accepts(&path)?;
			let page = match entry {
				PageEntry::Page(item) => PageMatch::Page(item),
				PageEntry::Parts(parts) => PageMatch::Parts(parts),
			};
			Some(RouteMatch {
				path: path.clone(),
				params,
				page,
			})
		})
	}

	/// Returns the root and layouts wrapping `path`, root first.
	///
	/// Exact pages are only wrapped by layouts reachable over literal
	/// segments.
	pub fn layout_chain_for(&self, path: &str) -> Vec<ChainLink<'_>> {
		let literal_only = self
			.match_route(path)
			.is_some_and(|m| m.page.is_exact());
		self.layout_chain(path, literal_only)
	}

	pub(crate) fn layout_chain(&self, path: &str, literal_only: bool) -> Vec<ChainLink<'_>> {
		let segments = split_path(path);
		let mut chain = Vec::new();
		if let Some(root) = &self.root {
			chain.push(ChainLink {
				item: root,
				id: ComponentId::root(),
				params: PathParams::new(),
			});
		}
		for (depth, item) in self.layouts.chain(&segments, literal_only) {
			let prefix = &segments[..depth];
			chain.push(ChainLink {
				item,
				id: ComponentId::layout(prefix),
				params: item
					.pattern()
					.matches(&prefix.join("/"))
					.unwrap_or_default(),
			});
		}
		chain
	}

	/// Returns the slice items a page renders, in declaration order.
	pub fn slices_for(&self, page: &RouteItem) -> Vec<&RouteItem> {
		page.slices()
			.iter()
			.filter_map(|id| self.slice(id))
			.collect()
	}

	/// Returns the slice registered under `id`.
	pub fn slice(&self, id: &str) -> Option<&RouteItem> {
		self.slice_index.get(id).map(|&index| &self.slices[index])
	}

	/// Finds an API route for `path` with a handler for `method`.
	pub fn api_match_for(&self, path: &str, method: &Method) -> Option<ApiMatch> {
		self.apis.iter().find_map(|item| {
			let handler = item.method_handlers().get(method)?;
			let params = item.accepts(path)?;
			Some(ApiMatch {
				path: item.path().to_string(),
				method: method.clone(),
				params,
				handler: Arc::clone(handler),
			})
		})
	}

	/// Returns the redirect target for `path`, if one is registered.
	pub fn redirect_for(&self, path: &str) -> Option<String> {
		self.redirects.iter().find_map(|redirect| {
			let params = redirect.from.matches(path)?;
			redirect.to.reverse(&params)
		})
	}

	/// Returns the custom not-found page.
	pub fn not_found_page(&self) -> Option<&RouteItem> {
		self.pages.iter().find_map(|entry| match entry {
			PageEntry::Page(item) if item.path().to_string() == NOT_FOUND_PATH => Some(item),
			_ => None,
		})
	}

	/// Enumerates the concrete paths of every static page.
	pub fn static_paths(&self) -> Vec<String> {
		let mut paths = Vec::new();
		for entry in &self.pages {
			let items: &[RouteItem] = match entry {
				PageEntry::Page(item) => std::slice::from_ref(item),
				PageEntry::Parts(parts) => parts,
			};
			if items.is_empty() || !items.iter().all(|i| i.render_mode().is_static()) {
				continue;
			}
			let Some(first) = entry.first() else {
				continue;
			};
			if first.path().is_static() {
				paths.push(first.path().to_string());
			} else {
				paths.extend(
					first
						.static_paths()
						.filter(|p| entry.accepts(p).is_some())
						.map(str::to_string),
				);
			}
		}
		paths
	}

	/// Returns the root item.
	pub fn root(&self) -> Option<&RouteItem> {
		self.root.as_ref()
	}

	/// Iterates over layouts in registration order.
	pub fn layouts(&self) -> impl Iterator<Item = &RouteItem> {
		self.layouts.iter()
	}

	/// Iterates over API routes in registration order.
	pub fn apis(&self) -> impl Iterator<Item = &RouteItem> {
		self.apis.iter()
	}
}
