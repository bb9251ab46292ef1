//! Resolved locations.

use crate::error::LocationError;
use crate::pattern::normalize_path;
use serde::{Deserialize, Serialize};
use url::Url;

// Relative hrefs are resolved against a throwaway origin; only the path,
// query and fragment are kept.
const PARSE_BASE: &str = "http://localhost/";

/// Ordered query-string multimap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchParams(Vec<(String, String)>);

impl SearchParams {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses an `application/x-www-form-urlencoded` query, with or without `?`.
	pub fn parse(query: &str) -> Self {
		let query = query.strip_prefix('?').unwrap_or(query);
		Self(
			url::form_urlencoded::parse(query.as_bytes())
				.map(|(k, v)| (k.into_owned(), v.into_owned()))
				.collect(),
		)
	}

	/// Appends a pair, keeping existing values for the key.
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.push((key.into(), value.into()));
	}

	/// Returns the first value for `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	/// Returns every value for `key` in order.
	pub fn get_all(&self, key: &str) -> Vec<&str> {
		self.0
			.iter()
			.filter(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
			.collect()
	}

	/// Iterates over all pairs in order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Returns `true` if there are no pairs.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Serializes back to a query string without the leading `?`.
	pub fn to_query_string(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new())
			.extend_pairs(self.0.iter())
			.finish()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchParams {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

/// The location a route is resolved for.
///
/// Used on the server when parsing a request and on the client when
/// parsing the browser location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteProps {
	/// Normalized path, `/` for the root.
	pub path: String,
	/// Query parameters in order.
	pub search_params: SearchParams,
	/// Fragment including the leading `#`, or empty.
	pub hash: String,
}

impl Default for RouteProps {
	fn default() -> Self {
		Self::new("/")
	}
}

impl RouteProps {
	/// Creates props for `path` with no query and no hash.
	pub fn new(path: &str) -> Self {
		Self {
			path: normalize_path(path),
			search_params: SearchParams::new(),
			hash: String::new(),
		}
	}

	/// Parses an absolute or root-relative href.
	///
	/// # Errors
	///
	/// Returns [`LocationError`] if the href is not a valid URL reference.
	pub fn parse(href: &str) -> Result<Self, LocationError> {
		let to_error = |source| LocationError {
			href: href.to_string(),
			source,
		};
		let base = Url::parse(PARSE_BASE).map_err(to_error)?;
		let url = base.join(href).map_err(to_error)?;
		Ok(Self {
			path: normalize_path(url.path()),
			search_params: url.query().map(SearchParams::parse).unwrap_or_default(),
			hash: url.fragment().map(|f| format!("#{}", f)).unwrap_or_default(),
		})
	}

	/// Adds a query pair.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.search_params.append(key, value);
		self
	}

	/// Sets the fragment; a missing leading `#` is added.
	pub fn with_hash(mut self, hash: &str) -> Self {
		self.hash = match hash {
			"" => String::new(),
			h if h.starts_with('#') => h.to_string(),
			h => format!("#{}", h),
		};
		self
	}

	/// Returns the query string including `?`, or empty.
	pub fn query(&self) -> String {
		if self.search_params.is_empty() {
			String::new()
		} else {
			format!("?{}", self.search_params.to_query_string())
		}
	}

	/// Formats the props back to an href.
	pub fn to_href(&self) -> String {
		format!("{}{}{}", self.path, self.query(), self.hash)
	}

	/// Returns `true` when only the fragments differ.
	pub fn same_document(&self, other: &Self) -> bool {
		self.path == other.path && self.search_params == other.search_params
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_href() {
		let props = RouteProps::parse("/search/?q=rust&tag=a&tag=b#top").unwrap();
		assert_eq!(props.path, "/search");
		assert_eq!(props.search_params.get("q"), Some("rust"));
		assert_eq!(props.search_params.get_all("tag"), vec!["a", "b"]);
		assert_eq!(props.hash, "#top");
		assert_eq!(props.to_href(), "/search?q=rust&tag=a&tag=b#top");
	}

	#[rstest]
	fn test_parse_absolute_url() {
		let props = RouteProps::parse("https://example.com/a/b?x=1").unwrap();
		assert_eq!(props.path, "/a/b");
		assert_eq!(props.search_params.get("x"), Some("1"));
		assert!(props.hash.is_empty());
	}

	#[rstest]
	fn test_query_decoding() {
		let params = SearchParams::parse("?name=a%20b&empty=");
		assert_eq!(params.get("name"), Some("a b"));
		assert_eq!(params.get("empty"), Some(""));
		assert_eq!(params.get("missing"), None);
	}

	#[rstest]
	fn test_same_document() {
		let a = RouteProps::new("/x").with_param("q", "1");
		let b = a.clone().with_hash("frag");
		let c = RouteProps::new("/x").with_param("q", "2");
		assert!(a.same_document(&b));
		assert!(!a.same_document(&c));
		assert_eq!(b.hash, "#frag");
	}
}
