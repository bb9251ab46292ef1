//! Component fetch contract.

use crate::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trellis_urls::skip::encode_skip_header;
use trellis_urls::{ComponentId, RouteProps, ShouldSkipConfig, SkipHeaderError};

/// A partial fetch issued by a navigation or prefetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
	/// `<base><rsc base>/<encoded route path>`.
	pub wire_path: String,
	/// Location being fetched.
	pub props: RouteProps,
	/// Ids the server may leave out.
	pub skip: Vec<ComponentId>,
	/// Name of the skip header.
	pub skip_header: String,
}

impl FetchRequest {
	/// Returns the query string including `?`, or empty.
	pub fn query(&self) -> String {
		self.props.query()
	}

	/// Returns the URL to request: wire path plus query.
	pub fn url(&self) -> String {
		format!("{}{}", self.wire_path, self.query())
	}

	/// Returns the skip header value, or `None` when nothing is skipped.
	pub fn skip_header_value(&self) -> Result<Option<String>, SkipHeaderError> {
		if self.skip.is_empty() {
			return Ok(None);
		}
		encode_skip_header(&self.skip).map(Some)
	}
}

/// Out-of-band signal carried by a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PayloadSignal {
	/// No route matched.
	NotFound {
		/// Whether the server rendered its custom not-found page.
		has_custom: bool,
	},
	/// The path redirects elsewhere.
	Redirect {
		/// Target href.
		location: String,
	},
}

/// The decoded response to a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct WirePayload<N> {
	/// Rendered nodes by id.
	pub elements: BTreeMap<ComponentId, N>,
	/// Reuse policies declared by the server.
	pub should_skip: BTreeMap<ComponentId, ShouldSkipConfig>,
	/// Not-found or redirect signal.
	pub signal: Option<PayloadSignal>,
}

impl<N> Default for WirePayload<N> {
	fn default() -> Self {
		Self {
			elements: BTreeMap::new(),
			should_skip: BTreeMap::new(),
			signal: None,
		}
	}
}

impl<N> WirePayload<N> {
	/// Creates an empty payload.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a rendered node.
	pub fn with_element(mut self, id: impl Into<ComponentId>, node: N) -> Self {
		self.elements.insert(id.into(), node);
		self
	}

	/// Adds a reuse policy.
	pub fn with_policy(mut self, id: impl Into<ComponentId>, policy: ShouldSkipConfig) -> Self {
		self.should_skip.insert(id.into(), policy);
		self
	}

	/// A redirect payload.
	pub fn redirect(location: impl Into<String>) -> Self {
		Self {
			signal: Some(PayloadSignal::Redirect {
				location: location.into(),
			}),
			..Self::default()
		}
	}

	/// A not-found payload.
	pub fn not_found(has_custom: bool) -> Self {
		Self {
			signal: Some(PayloadSignal::NotFound { has_custom }),
			..Self::default()
		}
	}
}

/// Result of a fetch.
pub type FetchResult<N> = Result<WirePayload<N>, FetchError>;

/// Transport resolving fetch requests to payloads.
///
/// The client runtime is single-threaded, so fetch futures need not be
/// `Send`.
#[async_trait(?Send)]
pub trait RscFetcher {
	/// Opaque rendered node.
	type Node: Clone + 'static;

	/// Fetches the payload for `request`.
	async fn fetch(&self, request: FetchRequest) -> FetchResult<Self::Node>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn request(skip: Vec<ComponentId>) -> FetchRequest {
		FetchRequest {
			wire_path: "/RSC/R/a.txt".to_string(),
			props: RouteProps::new("/a").with_param("q", "1"),
			skip,
			skip_header: trellis_urls::SKIP_HEADER.to_string(),
		}
	}

	#[rstest]
	fn test_request_url() {
		assert_eq!(request(Vec::new()).url(), "/RSC/R/a.txt?q=1");
	}

	#[rstest]
	fn test_skip_header_value() {
		assert_eq!(request(Vec::new()).skip_header_value().unwrap(), None);
		assert_eq!(
			request(vec![ComponentId::root()])
				.skip_header_value()
				.unwrap()
				.as_deref(),
			Some(r#"["root"]"#)
		);
	}

	#[rstest]
	fn test_signal_serialization() {
		let json = serde_json::to_string(&PayloadSignal::Redirect {
			location: "/exists".to_string(),
		})
		.unwrap();
		assert_eq!(json, r#"{"type":"redirect","location":"/exists"}"#);
		let signal: PayloadSignal =
			serde_json::from_str(r#"{"type":"notFound","hasCustom":true}"#).unwrap();
		assert_eq!(signal, PayloadSignal::NotFound { has_custom: true });
	}

	#[rstest]
	fn test_signal_fields_are_camel_case() {
		let json = serde_json::to_string(&PayloadSignal::NotFound { has_custom: true }).unwrap();
		assert_eq!(json, r#"{"type":"notFound","hasCustom":true}"#);
		assert!(
			serde_json::from_str::<PayloadSignal>(r#"{"type":"notFound","has_custom":true}"#)
				.is_err()
		);
	}
}
