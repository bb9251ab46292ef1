//! Path template parsing and matching.
//!
//! Templates use a bracketed segment syntax:
//!
//! - `/users` - literal segments, matched verbatim and case-sensitively
//! - `/users/[id]` - a group, matching exactly one non-empty segment
//! - `/docs/[...slug]` - a wildcard, matching one or more trailing segments
//!
//! A wildcard that is the only segment of a template (`/[...slug]`) also
//! matches the root path, binding an empty list.
//!
//! Templates compile to a [`regex::Regex`]. Candidate paths are normalized
//! before matching by dropping empty segments, so `/foo/` and `/foo` are the
//! same path.

use crate::error::PatternError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum allowed length for a path template in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of segments in a path template.
const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// One segment of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
	/// A literal segment.
	Literal(String),
	/// `[name]`: exactly one segment bound to `name`.
	Group(String),
	/// `[...name]`: the remaining segments bound to `name` as a list.
	Wildcard(String),
}

impl PathSegment {
	fn parse(raw: &str, template: &str) -> Result<Self, PatternError> {
		if let Some(name) = raw.strip_prefix("[...").and_then(|r| r.strip_suffix(']')) {
			if name.is_empty() {
				return Err(PatternError::EmptyParamName(template.to_string()));
			}
			return Ok(Self::Wildcard(name.to_string()));
		}
		if let Some(name) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
			if name.is_empty() {
				return Err(PatternError::EmptyParamName(template.to_string()));
			}
			return Ok(Self::Group(name.to_string()));
		}
		Ok(Self::Literal(raw.to_string()))
	}

	/// Returns the literal text or the bound parameter name.
	pub fn name(&self) -> &str {
		match self {
			Self::Literal(name) | Self::Group(name) | Self::Wildcard(name) => name,
		}
	}

	/// Returns `true` for groups and wildcards.
	pub fn is_dynamic(&self) -> bool {
		!matches!(self, Self::Literal(_))
	}

	fn shape(&self) -> SegmentShape {
		match self {
			Self::Literal(text) => SegmentShape::Literal(text.clone()),
			Self::Group(_) => SegmentShape::Group,
			Self::Wildcard(_) => SegmentShape::Wildcard,
		}
	}
}

impl fmt::Display for PathSegment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(text) => write!(f, "{}", text),
			Self::Group(name) => write!(f, "[{}]", name),
			Self::Wildcard(name) => write!(f, "[...{}]", name),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum SegmentShape {
	Literal(String),
	Group,
	Wildcard,
}

/// Shape of a [`PathSpec`] with parameter names erased.
///
/// Two specs with equal structural keys match exactly the same set of paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructuralKey(Vec<SegmentShape>);

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSpec {
	segments: Vec<PathSegment>,
	exact: bool,
}

impl PathSpec {
	/// Parses a bracketed template such as `/users/[id]/[...rest]`.
	///
	/// # Errors
	///
	/// Returns [`PatternError`] if the template is too long, has too many
	/// segments, has an unnamed parameter, a non-final wildcard, or binds the
	/// same name twice.
	pub fn parse(template: &str) -> Result<Self, PatternError> {
		let raw_segments = check_limits(template)?;
		let mut segments = Vec::with_capacity(raw_segments.len());
		for (index, raw) in raw_segments.iter().enumerate() {
			let segment = PathSegment::parse(raw, template)?;
			if matches!(segment, PathSegment::Wildcard(_)) && index + 1 != raw_segments.len() {
				return Err(PatternError::WildcardNotLast(template.to_string()));
			}
			if segment.is_dynamic()
				&& segments
					.iter()
					.any(|s: &PathSegment| s.is_dynamic() && s.name() == segment.name())
			{
				return Err(PatternError::DuplicateParam {
					name: segment.name().to_string(),
					pattern: template.to_string(),
				});
			}
			segments.push(segment);
		}
		Ok(Self {
			segments,
			exact: false,
		})
	}

	/// Parses a template whose segments are all literal, brackets included.
	///
	/// Exact specs match length-exactly and never bind parameters.
	pub fn parse_exact(template: &str) -> Result<Self, PatternError> {
		let segments = check_limits(template)?
			.into_iter()
			.map(|raw| PathSegment::Literal(raw.to_string()))
			.collect();
		Ok(Self {
			segments,
			exact: true,
		})
	}

	/// Builds a spec from already parsed segments.
	pub fn from_segments(segments: Vec<PathSegment>) -> Self {
		Self {
			segments,
			exact: false,
		}
	}

	/// Returns the segments in order.
	pub fn segments(&self) -> &[PathSegment] {
		&self.segments
	}

	/// Returns the number of segments.
	pub fn len(&self) -> usize {
		self.segments.len()
	}

	/// Returns `true` for the root spec `/`.
	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	/// Returns whether this spec was parsed as an exact path.
	pub fn is_exact(&self) -> bool {
		self.exact
	}

	/// Returns `true` if the spec has no groups or wildcards.
	pub fn is_static(&self) -> bool {
		self.segments.iter().all(|s| !s.is_dynamic())
	}

	/// Returns `true` if the final segment is a wildcard.
	pub fn has_wildcard(&self) -> bool {
		matches!(self.segments.last(), Some(PathSegment::Wildcard(_)))
	}

	/// Returns `true` if a group or wildcard binds `name`.
	pub fn binds(&self, name: &str) -> bool {
		self.segments
			.iter()
			.any(|s| s.is_dynamic() && s.name() == name)
	}

	/// Returns the names bound by groups and wildcards, in order.
	pub fn param_names(&self) -> Vec<&str> {
		self.segments
			.iter()
			.filter(|s| s.is_dynamic())
			.map(PathSegment::name)
			.collect()
	}

	/// Returns the structural key used for duplicate detection.
	pub fn structural_key(&self) -> StructuralKey {
		StructuralKey(self.segments.iter().map(PathSegment::shape).collect())
	}
}

impl fmt::Display for PathSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.segments.is_empty() {
			return write!(f, "/");
		}
		for segment in &self.segments {
			write!(f, "/{}", segment)?;
		}
		Ok(())
	}
}

fn check_limits(template: &str) -> Result<Vec<&str>, PatternError> {
	if template.len() > MAX_PATTERN_LENGTH {
		return Err(PatternError::TooLong {
			len: template.len(),
			max: MAX_PATTERN_LENGTH,
		});
	}
	let segments = split_path(template);
	if segments.len() > MAX_PATH_SEGMENTS {
		return Err(PatternError::TooManySegments {
			count: segments.len(),
			max: MAX_PATH_SEGMENTS,
		});
	}
	Ok(segments)
}

/// Splits a path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
	path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Normalizes a path to `/a/b` form, `/` for the root.
pub fn normalize_path(path: &str) -> String {
	let segments = split_path(path);
	if segments.is_empty() {
		"/".to_string()
	} else {
		format!("/{}", segments.join("/"))
	}
}

/// A captured parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
	/// Value of a group.
	One(String),
	/// Segments captured by a wildcard.
	Many(Vec<String>),
}

impl ParamValue {
	/// Returns the single value of a group.
	pub fn as_one(&self) -> Option<&str> {
		match self {
			Self::One(value) => Some(value),
			Self::Many(_) => None,
		}
	}

	/// Returns the segments captured by a wildcard.
	pub fn as_many(&self) -> Option<&[String]> {
		match self {
			Self::One(_) => None,
			Self::Many(values) => Some(values),
		}
	}
}

/// Parameters captured by a successful match, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathParams(BTreeMap<String, ParamValue>);

impl PathParams {
	/// Creates an empty parameter map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a value, replacing any previous binding.
	pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
		self.0.insert(name.into(), value);
	}

	/// Returns the value bound to `name`.
	pub fn get(&self, name: &str) -> Option<&ParamValue> {
		self.0.get(name)
	}

	/// Returns the group value bound to `name`.
	pub fn get_one(&self, name: &str) -> Option<&str> {
		self.0.get(name).and_then(ParamValue::as_one)
	}

	/// Returns the wildcard segments bound to `name`.
	pub fn get_many(&self, name: &str) -> Option<&[String]> {
		self.0.get(name).and_then(ParamValue::as_many)
	}

	/// Iterates over bindings in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
		self.0.iter()
	}

	/// Returns the number of bindings.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if nothing was captured.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// A path spec compiled to a regular expression.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
	spec: PathSpec,
	regex: regex::Regex,
}

impl CompiledPattern {
	/// Compiles a parsed spec.
	///
	/// # Errors
	///
	/// Returns [`PatternError::Regex`] if the generated expression exceeds the
	/// size limit.
	pub fn new(spec: PathSpec) -> Result<Self, PatternError> {
		let regex = regex::RegexBuilder::new(&Self::compile(&spec))
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| PatternError::Regex(e.to_string()))?;
		Ok(Self { spec, regex })
	}

	/// Parses and compiles a bracketed template.
	pub fn parse(template: &str) -> Result<Self, PatternError> {
		Self::new(PathSpec::parse(template)?)
	}

	fn compile(spec: &PathSpec) -> String {
		let sole_wildcard = spec.len() == 1 && spec.has_wildcard();
		let mut regex_str = String::from("^");
		for segment in spec.segments() {
			match segment {
				PathSegment::Literal(text) => {
					regex_str.push('/');
					regex_str.push_str(&regex::escape(text));
				}
				PathSegment::Group(_) => regex_str.push_str("/([^/]+)"),
				PathSegment::Wildcard(_) if sole_wildcard => regex_str.push_str("(?:/(.+))?"),
				PathSegment::Wildcard(_) => regex_str.push_str("/(.+)"),
			}
		}
		regex_str.push('$');
		regex_str
	}

	/// Returns the spec this pattern was compiled from.
	pub fn spec(&self) -> &PathSpec {
		&self.spec
	}

	/// Checks whether `path` matches without extracting parameters.
	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(&match_subject(path))
	}

	/// Matches `path`, returning the captured parameters.
	pub fn matches(&self, path: &str) -> Option<PathParams> {
		let subject = match_subject(path);
		let caps = self.regex.captures(&subject)?;
		let mut params = PathParams::new();
		let dynamic = self.spec.segments().iter().filter(|s| s.is_dynamic());
		for (index, segment) in dynamic.enumerate() {
			let captured = caps.get(index + 1).map(|m| m.as_str());
			match segment {
				PathSegment::Group(name) => {
					params.insert(
						name.clone(),
						ParamValue::One(captured.unwrap_or_default().to_string()),
					);
				}
				PathSegment::Wildcard(name) => {
					let values = captured
						.map(|c| split_path(c).into_iter().map(str::to_string).collect())
						.unwrap_or_default();
					params.insert(name.clone(), ParamValue::Many(values));
				}
				PathSegment::Literal(_) => {}
			}
		}
		Some(params)
	}

	/// Builds a concrete path from parameter values.
	///
	/// Returns `None` if a parameter is missing or has the wrong shape.
	pub fn reverse(&self, params: &PathParams) -> Option<String> {
		let mut segments: Vec<String> = Vec::with_capacity(self.spec.len());
		for segment in self.spec.segments() {
			match segment {
				PathSegment::Literal(text) => segments.push(text.clone()),
				PathSegment::Group(name) => segments.push(params.get_one(name)?.to_string()),
				PathSegment::Wildcard(name) => {
					let values = params.get_many(name)?;
					if values.is_empty() && self.spec.len() > 1 {
						return None;
					}
					segments.extend(values.iter().cloned());
				}
			}
		}
		Some(normalize_path(&segments.join("/")))
	}
}

impl PartialEq for CompiledPattern {
	fn eq(&self, other: &Self) -> bool {
		self.spec == other.spec
	}
}

impl Eq for CompiledPattern {}

impl fmt::Display for CompiledPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.spec)
	}
}

// The root path matches against the empty string so a sole wildcard's
// optional group can bind zero segments.
fn match_subject(path: &str) -> String {
	let normalized = normalize_path(path);
	if normalized == "/" {
		String::new()
	} else {
		normalized
	}
}

/// Parses a bracketed template. See [`PathSpec::parse`].
pub fn parse_path_spec(template: &str) -> Result<PathSpec, PatternError> {
	PathSpec::parse(template)
}

/// Parses a template with every segment literal. See [`PathSpec::parse_exact`].
pub fn parse_exact_path_spec(template: &str) -> Result<PathSpec, PatternError> {
	PathSpec::parse_exact(template)
}

/// Matches `path` against a bracketed `template`.
///
/// Returns `Ok(None)` when the path does not match.
pub fn match_path(template: &str, path: &str) -> Result<Option<PathParams>, PatternError> {
	Ok(CompiledPattern::parse(template)?.matches(path))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_segments() {
		let spec = PathSpec::parse("/foo/[id]/[...rest]").unwrap();
		assert_eq!(
			spec.segments(),
			&[
				PathSegment::Literal("foo".to_string()),
				PathSegment::Group("id".to_string()),
				PathSegment::Wildcard("rest".to_string()),
			]
		);
		assert!(!spec.is_exact());
		assert!(!spec.is_static());
		assert_eq!(spec.param_names(), vec!["id", "rest"]);
	}

	#[rstest]
	fn test_parse_root() {
		let spec = PathSpec::parse("/").unwrap();
		assert!(spec.is_empty());
		assert_eq!(spec.to_string(), "/");
	}

	#[rstest]
	#[case("/foo/[...rest]/bar")]
	#[case("/[...a]/[b]")]
	fn test_wildcard_must_be_last(#[case] template: &str) {
		assert!(matches!(
			PathSpec::parse(template),
			Err(PatternError::WildcardNotLast(_))
		));
	}

	#[rstest]
	#[case("/foo/[]")]
	#[case("/foo/[...]")]
	fn test_empty_param_name(#[case] template: &str) {
		assert!(matches!(
			PathSpec::parse(template),
			Err(PatternError::EmptyParamName(_))
		));
	}

	#[rstest]
	fn test_duplicate_param() {
		assert!(matches!(
			PathSpec::parse("/[id]/x/[id]"),
			Err(PatternError::DuplicateParam { .. })
		));
	}

	#[rstest]
	fn test_exact_spec_keeps_brackets() {
		let spec = PathSpec::parse_exact("/docs/[slug]").unwrap();
		assert!(spec.is_exact());
		assert!(spec.is_static());

		let pattern = CompiledPattern::new(spec).unwrap();
		assert!(pattern.is_match("/docs/[slug]"));
		assert!(!pattern.is_match("/docs/intro"));
	}

	#[rstest]
	fn test_structural_key_ignores_names() {
		let a = PathSpec::parse("/foo/[a]").unwrap();
		let b = PathSpec::parse("/foo/[b]").unwrap();
		let c = PathSpec::parse("/foo/[...c]").unwrap();
		assert_eq!(a.structural_key(), b.structural_key());
		assert_ne!(a.structural_key(), c.structural_key());
	}

	#[rstest]
	fn test_groups_bind_values() {
		let params = match_path("/foo/[x]/[y]", "/foo/bar/baz").unwrap().unwrap();
		assert_eq!(params.get_one("x"), Some("bar"));
		assert_eq!(params.get_one("y"), Some("baz"));
	}

	#[rstest]
	fn test_literal_is_case_sensitive() {
		let pattern = CompiledPattern::parse("/About").unwrap();
		assert!(pattern.is_match("/About"));
		assert!(!pattern.is_match("/about"));
	}

	#[rstest]
	fn test_wildcard_requires_a_segment() {
		assert!(match_path("/foo/[...x]", "/foo").unwrap().is_none());

		let params = match_path("/foo/[...x]", "/foo/a/b").unwrap().unwrap();
		assert_eq!(
			params.get_many("x"),
			Some(&["a".to_string(), "b".to_string()][..])
		);
	}

	#[rstest]
	fn test_sole_wildcard_matches_root() {
		let params = match_path("/[...x]", "/").unwrap().unwrap();
		assert_eq!(params.get_many("x"), Some(&[][..]));

		let params = match_path("/[...x]", "/a/b/c").unwrap().unwrap();
		assert_eq!(params.get_many("x").map(<[String]>::len), Some(3));
	}

	#[rstest]
	fn test_trailing_slash_is_normalized() {
		let pattern = CompiledPattern::parse("/foo/[id]").unwrap();
		assert!(pattern.is_match("/foo/1/"));
		assert!(pattern.is_match("//foo//1"));
	}

	#[rstest]
	fn test_special_chars_escaped() {
		let pattern = CompiledPattern::parse("/api/v1.0").unwrap();
		assert!(pattern.is_match("/api/v1.0"));
		assert!(!pattern.is_match("/api/v1X0"));
	}

	#[rstest]
	fn test_reverse() {
		let pattern = CompiledPattern::parse("/users/[id]/files/[...path]").unwrap();
		let mut params = PathParams::new();
		params.insert("id", ParamValue::One("42".to_string()));
		params.insert(
			"path",
			ParamValue::Many(vec!["a".to_string(), "b.txt".to_string()]),
		);
		assert_eq!(
			pattern.reverse(&params),
			Some("/users/42/files/a/b.txt".to_string())
		);

		let empty = PathParams::new();
		assert_eq!(pattern.reverse(&empty), None);
	}

	#[rstest]
	fn test_pattern_rejects_excessive_length() {
		let long_pattern = "/".to_string() + &"a".repeat(1025);
		assert!(matches!(
			PathSpec::parse(&long_pattern),
			Err(PatternError::TooLong { .. })
		));
	}

	#[rstest]
	fn test_pattern_rejects_excessive_segments() {
		let segments: Vec<&str> = (0..35).map(|_| "seg").collect();
		let template = format!("/{}", segments.join("/"));
		assert!(matches!(
			PathSpec::parse(&template),
			Err(PatternError::TooManySegments { .. })
		));
	}

	#[rstest]
	#[case("/", "/")]
	#[case("", "/")]
	#[case("/a/b/", "/a/b")]
	#[case("a//b", "/a/b")]
	fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize_path(input), expected);
	}
}
