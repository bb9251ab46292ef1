//! API endpoint contract.
//!
//! API routes are matched before pages. A matched route hands the request
//! to an [`ApiHandler`] registered for the request method.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::future::Future;
use std::sync::Arc;
use trellis_urls::{PathParams, RouteProps};

/// Response produced by an API handler.
pub type ApiResponse = http::Response<Bytes>;

/// Request handed to an API handler.
#[derive(Debug, Clone)]
pub struct ApiRequest {
	/// Request method.
	pub method: Method,
	/// Parsed location.
	pub props: RouteProps,
	/// Parameters captured by the API path.
	pub params: PathParams,
	/// Request headers.
	pub headers: HeaderMap,
	/// Request body.
	pub body: Bytes,
}

impl ApiRequest {
	/// Creates a bodiless request.
	pub fn new(method: Method, props: RouteProps) -> Self {
		Self {
			method,
			props,
			params: PathParams::new(),
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// Sets the body.
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Sets the headers.
	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}
}

/// Handles requests for one method of an API route.
#[async_trait]
pub trait ApiHandler: Send + Sync {
	/// Produces the response for `request`.
	async fn handle(&self, request: ApiRequest) -> ApiResponse;
}

/// Handler wrapping an async closure.
pub(crate) struct FnHandler<F> {
	handler: F,
}

#[async_trait]
impl<F, Fut> ApiHandler for FnHandler<F>
where
	F: Fn(ApiRequest) -> Fut + Send + Sync,
	Fut: Future<Output = ApiResponse> + Send,
{
	async fn handle(&self, request: ApiRequest) -> ApiResponse {
		(self.handler)(request).await
	}
}

/// Wraps an async closure as an [`ApiHandler`].
pub fn api_handler<F, Fut>(handler: F) -> Arc<dyn ApiHandler>
where
	F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ApiResponse> + Send + 'static,
{
	Arc::new(FnHandler { handler })
}

/// Builds a response with `status` and `body`.
pub fn response(status: StatusCode, body: impl Into<Bytes>) -> ApiResponse {
	let mut response = http::Response::new(body.into());
	*response.status_mut() = status;
	response
}

const KNOWN_METHODS: [Method; 9] = [
	Method::GET,
	Method::HEAD,
	Method::POST,
	Method::PUT,
	Method::DELETE,
	Method::CONNECT,
	Method::OPTIONS,
	Method::TRACE,
	Method::PATCH,
];

/// Parses a method key, accepting only the standard methods.
pub(crate) fn parse_method(key: &str) -> Option<Method> {
	let upper = key.to_ascii_uppercase();
	KNOWN_METHODS.into_iter().find(|m| m.as_str() == upper)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("GET", Some(Method::GET))]
	#[case("post", Some(Method::POST))]
	#[case("Patch", Some(Method::PATCH))]
	#[case("FETCH", None)]
	#[case("", None)]
	fn test_parse_method(#[case] key: &str, #[case] expected: Option<Method>) {
		assert_eq!(parse_method(key), expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_closure_handler() {
		let handler = api_handler(|req: ApiRequest| async move {
			response(StatusCode::OK, format!("{} {}", req.method, req.props.path))
		});
		let res = handler
			.handle(ApiRequest::new(Method::POST, RouteProps::new("/api/x")))
			.await;
		assert_eq!(res.status(), StatusCode::OK);
		assert_eq!(res.body().as_ref(), b"POST /api/x");
	}
}
