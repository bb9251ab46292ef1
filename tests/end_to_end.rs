//! Client router navigating against the server resolver through a loopback
//! fetcher.

use async_trait::async_trait;
use http::Method;
use rstest::{fixture, rstest};
use serde_json::Value;
use std::cell::RefCell;
use std::sync::Arc;
use trellis::pages::router::{FetchRequest, FetchResult, WirePayload};
use trellis::pages::FetchError;
use trellis::prelude::*;
use trellis::routes::{ComponentRef, RenderError};

struct TextRenderer;

impl Renderer for TextRenderer {
	type Node = String;

	fn render(&self, component: &ComponentRef, props: &Value) -> Result<String, RenderError> {
		Ok(format!("{} {}", component, props))
	}
}

/// Serves fetches by running the resolver in-process.
struct Loopback {
	resolver: Resolver,
	requests: RefCell<Vec<FetchRequest>>,
}

impl Loopback {
	fn payload(&self, route: &ResolvedRoute) -> FetchResult<String> {
		let rendered = route
			.render(&TextRenderer)
			.map_err(|e| FetchError::new(e.to_string()))?;
		let mut payload = WirePayload::new();
		for entry in rendered {
			payload = payload.with_element(entry.id, entry.node);
		}
		payload.should_skip = route.should_skip.clone();
		Ok(payload)
	}
}

#[async_trait(?Send)]
impl RscFetcher for Loopback {
	type Node = String;

	async fn fetch(&self, request: FetchRequest) -> FetchResult<String> {
		self.requests.borrow_mut().push(request.clone());
		let header = request
			.skip_header_value()
			.map_err(|e| FetchError::new(e.to_string()))?;
		let resolution = self
			.resolver
			.resolve_wire(&request.wire_path, &request.query(), &Method::GET, header.as_deref())
			.map_err(|e| FetchError::new(e.to_string()))?;
		match resolution {
			Resolution::Route(route) => self.payload(&route),
			Resolution::Redirect { location } => Ok(WirePayload::redirect(location)),
			Resolution::NotFound { custom } => match custom {
				Some(route) => {
					let mut payload = self.payload(&route)?;
					payload.signal = WirePayload::<String>::not_found(true).signal;
					Ok(payload)
				}
				None => Ok(WirePayload::not_found(false)),
			},
			other => Err(FetchError::new(format!("unexpected resolution: {:?}", other))),
		}
	}
}

#[fixture]
fn resolver() -> Resolver {
	let mut registry = Registry::new();
	registry
		.register_root(RootDescriptor::new(RenderMode::Static, "Shell"))
		.unwrap()
		.register_layout(LayoutDescriptor::new("/", RenderMode::Static, "Main"))
		.unwrap()
		.register_page(PageDescriptor::new("/", "Home").render(RenderMode::Static))
		.unwrap()
		.register_page(PageDescriptor::new("/foo", "Foo").render(RenderMode::Static))
		.unwrap()
		.register_page(PageDescriptor::new("/foo/[id]", "FooItem").render(RenderMode::Dynamic))
		.unwrap()
		.register_page(PageDescriptor::new("/exists", "Exists"))
		.unwrap()
		.register_page(
			PageDescriptor::new("/search", "Search")
				.should_skip(ShouldSkipConfig::path_sensitive().with_keys(["q"])),
		)
		.unwrap()
		.register_page(PageDescriptor::new("/404", "NotFound").render(RenderMode::Static))
		.unwrap()
		.register_redirect("/redirect", "/exists")
		.unwrap();
	Resolver::new(Arc::new(registry.build().unwrap()))
}

type Router = ClientRouter<Loopback, MemoryHistory>;

#[fixture]
fn router(resolver: Resolver) -> Router {
	ClientRouter::new(
		Loopback {
			resolver,
			requests: RefCell::new(Vec::new()),
		},
		MemoryHistory::new("/"),
		RouterSettings::default(),
	)
}

fn request_count(router: &Router) -> usize {
	router.fetcher().requests.borrow().len()
}

#[rstest]
fn test_static_and_dynamic_siblings(resolver: Resolver) {
	let Resolution::Route(item) = resolver.resolve_path("/foo/123", &[]) else {
		panic!("expected a route");
	};
	assert_eq!(item.render_mode, RenderMode::Dynamic);
	assert_eq!(item.params.get_one("id"), Some("123"));

	let Resolution::Route(foo) = resolver.resolve_path("/foo", &[]) else {
		panic!("expected a route");
	};
	assert_eq!(foo.render_mode, RenderMode::Static);
	assert!(foo.params.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_dynamic_page_props(router: Router) {
	router.push("/foo/123").await.unwrap();
	let page = router.element("foo/123/page").unwrap();
	assert!(page.starts_with("FooItem "));
	assert!(page.contains(r#""id":"123""#));
	assert!(page.contains(r#""path":"/foo/123""#));
}

#[rstest]
#[tokio::test]
async fn test_redirect_then_back(router: Router) {
	router.push("/foo").await.unwrap();
	router.push("/redirect").await.unwrap();

	assert_eq!(router.location().path, "/exists");
	assert_eq!(router.history().entries(), ["/", "/foo", "/exists"]);
	assert!(router.element("exists/page").is_some());

	assert!(router.history_mut().back());
	let before = request_count(&router);
	let outcome = router.handle_popstate().await.unwrap();

	// Everything under `/foo` is static and still cached.
	assert_eq!(outcome, NavigationOutcome::Skipped);
	assert_eq!(router.location().path, "/foo");
	assert_eq!(request_count(&router), before);
	let ids: Vec<String> = router
		.current_elements()
		.into_iter()
		.map(|(id, _)| id.to_string())
		.collect();
	assert_eq!(ids, ["root", "layout", "foo/page"]);
}

#[rstest]
#[tokio::test]
async fn test_query_sensitive_page(router: Router) {
	router.push("/search?q=rust").await.unwrap();
	assert_eq!(
		router.push("/search?q=rust&page=2").await.unwrap(),
		NavigationOutcome::Skipped
	);
	assert_eq!(
		router.push("/search?q=wasm").await.unwrap(),
		NavigationOutcome::Applied
	);

	let requests = router.fetcher().requests.borrow();
	assert_eq!(requests.len(), 2);
	let skipped: Vec<&str> = requests[1].skip.iter().map(ComponentId::as_str).collect();
	assert_eq!(skipped, ["root", "layout", "search/layout"]);
	assert!(router.element("search/page").unwrap().contains("Search"));
}

#[rstest]
#[tokio::test]
async fn test_custom_not_found(router: Router) {
	router.push("/foo").await.unwrap();
	let outcome = router.push("/nope").await.unwrap();

	assert_eq!(outcome, NavigationOutcome::NotFound);
	assert_eq!(router.location().path, "/foo");
	assert!(router.element("404/page").unwrap().starts_with("NotFound "));

	let ids: Vec<String> = router
		.current_elements()
		.into_iter()
		.map(|(id, _)| id.to_string())
		.collect();
	assert_eq!(ids, ["root", "layout", "404/page"]);
	assert!(router.element("root").unwrap().starts_with("Shell "));
}
