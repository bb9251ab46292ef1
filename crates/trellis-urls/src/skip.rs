//! Skip-list policies and the skip header.
//!
//! The server declares, per [`ComponentId`], whether a client may reuse a
//! cached render when navigating to a new location. A partial navigation
//! sends the ids it considers fresh in [`SKIP_HEADER`]; the server omits
//! those subtrees from its response.

use crate::component_id::ComponentId;
use crate::error::SkipHeaderError;
use crate::location::RouteProps;
use serde::{Deserialize, Serialize};

/// Request header carrying the JSON array of ids to omit.
pub const SKIP_HEADER: &str = "X-Trellis-Router-Skip";

/// Server-declared reuse policy of one component.
///
/// The presence of a policy makes a component checkable. An empty policy
/// means a cached render is always reusable; `path` makes it stale when the
/// path changes; `keys` makes it stale when any listed query key changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShouldSkipConfig {
	/// Sensitive to the path.
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub path: bool,
	/// Sensitive to these query keys.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub keys: Vec<String>,
}

impl ShouldSkipConfig {
	/// A policy that always allows reuse.
	pub fn always() -> Self {
		Self::default()
	}

	/// A policy that allows reuse while the path is unchanged.
	pub fn path_sensitive() -> Self {
		Self {
			path: true,
			keys: Vec::new(),
		}
	}

	/// Adds query keys the component depends on.
	pub fn with_keys<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.keys.extend(keys.into_iter().map(Into::into));
		self
	}

	/// Returns `true` if a render cached for `cached` is still valid for `next`.
	pub fn is_fresh(&self, cached: &RouteProps, next: &RouteProps) -> bool {
		if self.path && cached.path != next.path {
			return false;
		}
		self.keys.iter().all(|key| {
			cached.search_params.get_all(key) == next.search_params.get_all(key)
		})
	}
}

/// Serializes ids for [`SKIP_HEADER`].
pub fn encode_skip_header(ids: &[ComponentId]) -> Result<String, SkipHeaderError> {
	serde_json::to_string(ids).map_err(|e| SkipHeaderError::Malformed(e.to_string()))
}

/// Parses a [`SKIP_HEADER`] value; an absent header means "send everything".
pub fn parse_skip_header(value: Option<&str>) -> Result<Vec<ComponentId>, SkipHeaderError> {
	match value {
		None => Ok(Vec::new()),
		Some(raw) => {
			serde_json::from_str(raw).map_err(|e| SkipHeaderError::Malformed(e.to_string()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_path_policy_ignores_query() {
		let policy = ShouldSkipConfig::path_sensitive();
		let cached = RouteProps::new("/a").with_param("q", "1");
		let next = RouteProps::new("/a").with_param("q", "2");
		assert!(policy.is_fresh(&cached, &next));
		assert!(!policy.is_fresh(&cached, &RouteProps::new("/b")));
	}

	#[rstest]
	fn test_key_policy() {
		let policy = ShouldSkipConfig::always().with_keys(["q"]);
		let cached = RouteProps::new("/a").with_param("q", "1");
		assert!(!policy.is_fresh(&cached, &RouteProps::new("/a").with_param("q", "2")));
		assert!(policy.is_fresh(&cached, &RouteProps::new("/b").with_param("q", "1")));
		assert!(policy.is_fresh(
			&cached,
			&RouteProps::new("/a").with_param("q", "1").with_param("other", "x")
		));
	}

	#[rstest]
	fn test_header_round_trip() {
		let ids = vec![ComponentId::root(), ComponentId::new("a/layout")];
		let header = encode_skip_header(&ids).unwrap();
		assert_eq!(header, r#"["root","a/layout"]"#);
		assert_eq!(parse_skip_header(Some(&header)).unwrap(), ids);
	}

	#[rstest]
	fn test_absent_header_means_nothing_skipped() {
		assert!(parse_skip_header(None).unwrap().is_empty());
	}

	#[rstest]
	#[case("not json")]
	#[case(r#"{"a":1}"#)]
	#[case("[1,2]")]
	fn test_malformed_header(#[case] raw: &str) {
		assert!(matches!(
			parse_skip_header(Some(raw)),
			Err(SkipHeaderError::Malformed(_))
		));
	}

	#[rstest]
	fn test_policy_serialization() {
		let json = serde_json::to_string(&ShouldSkipConfig::always()).unwrap();
		assert_eq!(json, "{}");
		let json = serde_json::to_string(&ShouldSkipConfig::path_sensitive().with_keys(["q"]))
			.unwrap();
		assert_eq!(json, r#"{"path":true,"keys":["q"]}"#);
	}
}
