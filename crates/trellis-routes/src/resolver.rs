//! Server-side request resolution.
//!
//! Resolution checks API routes first, then redirects, then pages. A page
//! match is composed into the ordered entries to render: the root, the
//! layout chain, the page (or its parts) and its slices. Entries whose ids
//! the client reported as fresh are left out.

use crate::api::{ApiRequest, ApiResponse};
use crate::error::ResolveError;
use crate::item::{ComponentRef, RenderMode, RouteItem, RouteKind};
use crate::table::{ApiMatch, PageMatch, RouteMatch, RouteTable};
use http::Method;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use trellis_conf::RouterSettings;
use trellis_urls::codec::{WireTarget, parse_wire_path};
use trellis_urls::component_id::NOT_FOUND_PATH;
use trellis_urls::pattern::split_path;
use trellis_urls::skip::parse_skip_header;
use trellis_urls::{ComponentId, PathParams, RouteProps, SearchParams, ShouldSkipConfig};

/// One component to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
	/// Component id for the concrete path.
	pub id: ComponentId,
	/// Kind of the item the entry comes from.
	pub kind: RouteKind,
	/// Whether the output may come from a precomputed artifact.
	pub render_mode: RenderMode,
	/// Component to render.
	pub component: ComponentRef,
	/// Props: captured parameters, plus the `path` prop for pages.
	pub props: Value,
}

/// The composition resolved for one path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
	/// Normalized concrete path.
	pub path: String,
	/// Parameters captured by the page.
	pub params: PathParams,
	/// Render mode of the page.
	pub render_mode: RenderMode,
	/// Entries to render, root first, slices last.
	pub entries: Vec<ResolvedEntry>,
	/// Ids left out because the client holds fresh copies.
	pub skipped: Vec<ComponentId>,
	/// Reuse policies for every id of the composition.
	pub should_skip: BTreeMap<ComponentId, ShouldSkipConfig>,
}

impl ResolvedRoute {
	/// Returns the entry rendered for `id`.
	pub fn entry(&self, id: &str) -> Option<&ResolvedEntry> {
		self.entries.iter().find(|e| e.id.as_str() == id)
	}

	/// Returns the ids of the rendered entries in order.
	pub fn ids(&self) -> Vec<&ComponentId> {
		self.entries.iter().map(|e| &e.id).collect()
	}

	/// Returns `true` if every rendered entry is static.
	pub fn is_static(&self) -> bool {
		self.entries.iter().all(|e| e.render_mode.is_static())
	}
}

/// Outcome of resolving a request.
#[derive(Debug, Clone)]
pub enum Resolution {
	/// An API route handles the request.
	Api(ApiMatch),
	/// The path is redirected.
	Redirect {
		/// Target path.
		location: String,
	},
	/// A page matched.
	Route(ResolvedRoute),
	/// A slice fetch.
	Slice(ResolvedRoute),
	/// Nothing matched.
	NotFound {
		/// Composition of the custom not-found page, if one is registered.
		custom: Option<ResolvedRoute>,
	},
}

/// Resolves requests against a shared [`RouteTable`].
#[derive(Debug, Clone)]
pub struct Resolver {
	table: Arc<RouteTable>,
	settings: RouterSettings,
}

impl Resolver {
	/// Creates a resolver with default settings.
	pub fn new(table: Arc<RouteTable>) -> Self {
		Self {
			table,
			settings: RouterSettings::default(),
		}
	}

	/// Replaces the settings.
	pub fn with_settings(mut self, settings: RouterSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Returns the route table.
	pub fn table(&self) -> &RouteTable {
		&self.table
	}

	/// Returns the settings.
	pub fn settings(&self) -> &RouterSettings {
		&self.settings
	}

	/// Resolves a request for `props` with `method`, leaving out `skip`.
	pub fn resolve(&self, props: &RouteProps, method: &Method, skip: &[ComponentId]) -> Resolution {
		if let Some(api) = self.table.api_match_for(&props.path, method) {
			tracing::debug!(path = %props.path, %method, api = %api.path, "resolved API route");
			return Resolution::Api(api);
		}
		if let Some(location) = self.table.redirect_for(&props.path) {
			tracing::debug!(path = %props.path, %location, "resolved redirect");
			return Resolution::Redirect { location };
		}
		let skip: HashSet<&str> = skip.iter().map(ComponentId::as_str).collect();
		if let Some(matched) = self.table.match_route(&props.path) {
			let route = self.compose(&matched, &skip);
			tracing::debug!(
				path = %route.path,
				render_mode = ?route.render_mode,
				entries = route.entries.len(),
				skipped = route.skipped.len(),
				"resolved page"
			);
			return Resolution::Route(route);
		}
		let custom = self.table.not_found_page().map(|page| {
			let matched = RouteMatch {
				path: NOT_FOUND_PATH.to_string(),
				params: PathParams::new(),
				page: PageMatch::Page(page),
			};
			self.compose(&matched, &skip)
		});
		tracing::debug!(path = %props.path, custom = custom.is_some(), "no route matched");
		Resolution::NotFound { custom }
	}

	/// Resolves a path without query, as a `GET`.
	pub fn resolve_path(&self, path: &str, skip: &[ComponentId]) -> Resolution {
		self.resolve(&RouteProps::new(path), &Method::GET, skip)
	}

	/// Resolves a component fetch addressed by wire path.
	///
	/// # Errors
	///
	/// Fails if the wire path or the skip header cannot be decoded, or if the
	/// wire path names a server function.
	pub fn resolve_wire(
		&self,
		wire_path: &str,
		query: &str,
		method: &Method,
		skip_header: Option<&str>,
	) -> Result<Resolution, ResolveError> {
		let target = parse_wire_path(&self.settings.base_path, &self.settings.rsc_base, wire_path)?;
		let skip = parse_skip_header(skip_header)?;
		match target {
			WireTarget::Route(path) => {
				let mut props = RouteProps::new(&path);
				props.search_params = SearchParams::parse(query);
				Ok(self.resolve(&props, method, &skip))
			}
			WireTarget::Slice(id) => Ok(self
				.resolve_slice(&id, &skip)
				.map(Resolution::Slice)
				.unwrap_or(Resolution::NotFound { custom: None })),
			WireTarget::Func(id) | WireTarget::Other(id) => Err(ResolveError::UnsupportedTarget(id)),
		}
	}

	/// Resolves a single slice, or `None` if `slice_id` is unknown.
	pub fn resolve_slice(&self, slice_id: &str, skip: &[ComponentId]) -> Option<ResolvedRoute> {
		let item = self.table.slice(slice_id)?;
		let id = ComponentId::slice(slice_id);
		let mut route = ResolvedRoute {
			path: String::new(),
			params: PathParams::new(),
			render_mode: item.render_mode(),
			entries: Vec::new(),
			skipped: Vec::new(),
			should_skip: BTreeMap::new(),
		};
		let skip: HashSet<&str> = skip.iter().map(ComponentId::as_str).collect();
		push_entry(&mut route, &skip, id, item, Value::Object(Map::new()));
		Some(route)
	}

	/// Invokes the handler of a matched API route.
	pub async fn invoke_api(&self, api: &ApiMatch, mut request: ApiRequest) -> ApiResponse {
		request.params = api.params.clone();
		api.handler.handle(request).await
	}

	fn compose(&self, matched: &RouteMatch<'_>, skip: &HashSet<&str>) -> ResolvedRoute {
		let segments = split_path(&matched.path);
		let mut route = ResolvedRoute {
			path: matched.path.clone(),
			params: matched.params.clone(),
			render_mode: matched.page.render_mode(),
			entries: Vec::new(),
			skipped: Vec::new(),
			should_skip: BTreeMap::new(),
		};

		for link in self.table.layout_chain(&matched.path, matched.page.is_exact()) {
			let props = param_props(&link.params);
			push_entry(&mut route, skip, link.id, link.item, props);
		}

		let page_id = ComponentId::page(&segments);
		let props = page_props(&matched.params, &matched.path);
		match matched.page {
			PageMatch::Page(page) => {
				push_entry(&mut route, skip, page_id, page, props);
			}
			PageMatch::Parts(parts) => {
				let page_skipped = skip.contains(page_id.as_str());
				if route.render_mode.is_static() {
					route
						.should_skip
						.insert(page_id.clone(), ShouldSkipConfig::always());
				}
				if page_skipped {
					route.skipped.push(page_id);
				}
				for part in parts {
					let part_id = ComponentId::page_part(&segments, part.order());
					if page_skipped {
						if let Some(policy) = part.skip_policy() {
							route.should_skip.insert(part_id, policy);
						}
						continue;
					}
					push_entry(&mut route, skip, part_id, part, props.clone());
				}
			}
		}

		for slice_id in matched.page.slices() {
			if let Some(item) = self.table.slice(slice_id) {
				let props = Value::Object(Map::new());
				push_entry(&mut route, skip, ComponentId::slice(slice_id), item, props);
			}
		}
		route
	}
}

fn push_entry(
	route: &mut ResolvedRoute,
	skip: &HashSet<&str>,
	id: ComponentId,
	item: &RouteItem,
	props: Value,
) {
	if let Some(policy) = item.skip_policy() {
		route.should_skip.insert(id.clone(), policy);
	}
	if skip.contains(id.as_str()) {
		route.skipped.push(id);
		return;
	}
	route.entries.push(ResolvedEntry {
		id,
		kind: item.kind(),
		render_mode: item.render_mode(),
		component: item.component().clone(),
		props,
	});
}

fn param_map(params: &PathParams) -> Map<String, Value> {
	match serde_json::to_value(params) {
		Ok(Value::Object(map)) => map,
		_ => Map::new(),
	}
}

/// Layout props: only what the layout path captured.
fn param_props(params: &PathParams) -> Value {
	Value::Object(param_map(params))
}

/// Page props: captured parameters plus the concrete `path`.
fn page_props(params: &PathParams, path: &str) -> Value {
	let mut props = param_map(params);
	props.insert("path".to_string(), Value::String(path.to_string()));
	Value::Object(props)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::{api_handler, response};
	use crate::descriptor::{
		ApiDescriptor, LayoutDescriptor, PageDescriptor, PagePartDescriptor, RootDescriptor,
		SliceDescriptor,
	};
	use crate::registry::Registry;
	use http::StatusCode;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn resolver() -> Resolver {
		let mut registry = Registry::new();
		registry
			.register_root(RootDescriptor::new(RenderMode::Static, "Root"))
			.unwrap()
			.register_layout(LayoutDescriptor::new("/", RenderMode::Static, "MainLayout"))
			.unwrap()
			.register_layout(LayoutDescriptor::new("/shop", RenderMode::Dynamic, "ShopLayout"))
			.unwrap()
			.register_page(PageDescriptor::new("/", "Home").render(RenderMode::Static))
			.unwrap()
			.register_page(
				PageDescriptor::new("/shop/[item]", "Item")
					.render(RenderMode::Dynamic)
					.slices(["cart"]),
			)
			.unwrap()
			.register_slice(
				SliceDescriptor::new("cart", RenderMode::Dynamic, "Cart")
					.should_skip(ShouldSkipConfig::always().with_keys(["cart"])),
			)
			.unwrap()
			.register_page_part(PagePartDescriptor::new("/about", RenderMode::Static, "B", 1))
			.unwrap()
			.register_page_part(PagePartDescriptor::new("/about", RenderMode::Static, "A", 0))
			.unwrap()
			.register_page(PageDescriptor::new("/404", "NotFound").render(RenderMode::Static))
			.unwrap()
			.register_api(ApiDescriptor::new("/shop/[item]").method(
				"POST",
				api_handler(|req: ApiRequest| async move {
					let item = req.params.get_one("item").unwrap_or_default().to_string();
					response(StatusCode::CREATED, item)
				}),
			))
			.unwrap()
			.register_redirect("/store/[item]", "/shop/[item]")
			.unwrap();
		Resolver::new(Arc::new(registry.build().unwrap()))
	}

	fn ids(route: &ResolvedRoute) -> Vec<&str> {
		route.entries.iter().map(|e| e.id.as_str()).collect()
	}

	#[rstest]
	fn test_composition_order(resolver: Resolver) {
		let Resolution::Route(route) = resolver.resolve_path("/shop/42", &[]) else {
			panic!("expected a route");
		};
		assert_eq!(
			ids(&route),
			["root", "layout", "shop/layout", "shop/42/page", "slice:cart"]
		);
		assert_eq!(route.render_mode, RenderMode::Dynamic);
		assert_eq!(
			route.entry("shop/42/page").unwrap().props,
			json!({ "item": "42", "path": "/shop/42" })
		);
		assert!(!route.is_static());
	}

	#[rstest]
	fn test_skip_list_omits_entries(resolver: Resolver) {
		let skip = vec![ComponentId::root(), ComponentId::new("layout")];
		let Resolution::Route(route) = resolver.resolve_path("/shop/42", &skip) else {
			panic!("expected a route");
		};
		assert_eq!(ids(&route), ["shop/layout", "shop/42/page", "slice:cart"]);
		assert_eq!(route.skipped, skip);
		assert!(route.should_skip.contains_key("root"));
	}

	#[rstest]
	fn test_skip_policies(resolver: Resolver) {
		let Resolution::Route(route) = resolver.resolve_path("/shop/42", &[]) else {
			panic!("expected a route");
		};
		assert_eq!(
			route.should_skip.get("layout"),
			Some(&ShouldSkipConfig::always())
		);
		assert_eq!(route.should_skip.get("shop/layout"), None);
		assert_eq!(route.should_skip.get("shop/42/page"), None);
		assert_eq!(
			route.should_skip.get("slice:cart"),
			Some(&ShouldSkipConfig::always().with_keys(["cart"]))
		);
	}

	#[rstest]
	fn test_page_parts_ordered(resolver: Resolver) {
		let Resolution::Route(route) = resolver.resolve_path("/about", &[]) else {
			panic!("expected a route");
		};
		assert_eq!(ids(&route), ["root", "layout", "about/page:0", "about/page:1"]);
		assert_eq!(route.render_mode, RenderMode::Static);
		assert!(route.is_static());

		let skip = vec![ComponentId::new("about/page")];
		let Resolution::Route(route) = resolver.resolve_path("/about", &skip) else {
			panic!("expected a route");
		};
		assert_eq!(ids(&route), ["root", "layout"]);
	}

	#[rstest]
	fn test_api_first(resolver: Resolver) {
		let resolution = resolver.resolve(&RouteProps::new("/shop/9"), &Method::POST, &[]);
		assert!(matches!(resolution, Resolution::Api(ref api) if api.params.get_one("item") == Some("9")));

		let resolution = resolver.resolve(&RouteProps::new("/shop/9"), &Method::GET, &[]);
		assert!(matches!(resolution, Resolution::Route(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_invoke_api(resolver: Resolver) {
		let props = RouteProps::new("/shop/9");
		let Resolution::Api(api) = resolver.resolve(&props, &Method::POST, &[]) else {
			panic!("expected an API match");
		};
		let res = resolver
			.invoke_api(&api, ApiRequest::new(Method::POST, props))
			.await;
		assert_eq!(res.status(), StatusCode::CREATED);
		assert_eq!(res.body().as_ref(), b"9");
	}

	#[rstest]
	fn test_redirect(resolver: Resolver) {
		assert!(matches!(
			resolver.resolve_path("/store/7", &[]),
			Resolution::Redirect { ref location } if location == "/shop/7"
		));
	}

	#[rstest]
	fn test_not_found_custom(resolver: Resolver) {
		let Resolution::NotFound { custom: Some(route) } = resolver.resolve_path("/nope/x", &[])
		else {
			panic!("expected a custom not-found page");
		};
		assert_eq!(ids(&route), ["root", "layout", "404/page"]);
	}

	#[rstest]
	fn test_layout_keeps_its_path_param() {
		let mut registry = Registry::new();
		registry
			.register_layout(LayoutDescriptor::new("/[path]", RenderMode::Dynamic, "Section"))
			.unwrap()
			.register_page(PageDescriptor::new("/[slug]/x", "X"))
			.unwrap();
		let resolver = Resolver::new(Arc::new(registry.build().unwrap()));
		let Resolution::Route(route) = resolver.resolve_path("/docs/x", &[]) else {
			panic!("expected a route");
		};
		assert_eq!(route.entry("docs/layout").unwrap().props, json!({ "path": "docs" }));
		assert_eq!(
			route.entry("docs/x/page").unwrap().props,
			json!({ "slug": "docs", "path": "/docs/x" })
		);
	}

	#[rstest]
	fn test_not_found_generic() {
		let resolver = Resolver::new(Arc::new(Registry::new().build().unwrap()));
		assert!(matches!(
			resolver.resolve_path("/x", &[]),
			Resolution::NotFound { custom: None }
		));
	}

	#[rstest]
	fn test_resolve_wire_route(resolver: Resolver) {
		let resolution = resolver
			.resolve_wire(
				"/RSC/R/shop/42.txt",
				"?cart=1",
				&Method::GET,
				Some(r#"["root"]"#),
			)
			.unwrap();
		let Resolution::Route(route) = resolution else {
			panic!("expected a route");
		};
		assert_eq!(route.skipped, vec![ComponentId::root()]);
	}

	#[rstest]
	fn test_resolve_wire_slice(resolver: Resolver) {
		let Resolution::Slice(route) = resolver
			.resolve_wire("/RSC/S/cart.txt", "", &Method::GET, None)
			.unwrap()
		else {
			panic!("expected a slice");
		};
		assert_eq!(ids(&route), ["slice:cart"]);

		assert!(matches!(
			resolver
				.resolve_wire("/RSC/S/missing.txt", "", &Method::GET, None)
				.unwrap(),
			Resolution::NotFound { custom: None }
		));
	}

	#[rstest]
	#[case("/elsewhere/R/x.txt")]
	#[case("/RSC/F/mod/run.txt")]
	fn test_resolve_wire_errors(resolver: Resolver, #[case] wire: &str) {
		assert!(
			resolver
				.resolve_wire(wire, "", &Method::GET, None)
				.is_err()
		);
	}

	#[rstest]
	fn test_resolve_wire_bad_skip_header(resolver: Resolver) {
		assert!(matches!(
			resolver.resolve_wire("/RSC/R/_root.txt", "", &Method::GET, Some("nope")),
			Err(ResolveError::SkipHeader(_))
		));
	}
}
