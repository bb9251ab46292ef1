//! Error types for patterns, codecs and locations.

use thiserror::Error;

/// Error raised while parsing or compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
	/// The template exceeds the maximum accepted length.
	#[error("Pattern length {len} exceeds maximum allowed length of {max} bytes")]
	TooLong {
		/// Length of the rejected template.
		len: usize,
		/// Maximum accepted length.
		max: usize,
	},

	/// The template has more segments than accepted.
	#[error("Pattern has {count} path segments, exceeding maximum of {max}")]
	TooManySegments {
		/// Number of segments in the rejected template.
		count: usize,
		/// Maximum accepted segment count.
		max: usize,
	},

	/// A `[]` or `[...]` segment without a name.
	#[error("Empty parameter name in pattern: {0}")]
	EmptyParamName(String),

	/// A wildcard segment that is not the final segment.
	#[error("Wildcard must be the final segment: {0}")]
	WildcardNotLast(String),

	/// The same parameter name bound twice.
	#[error("Duplicate parameter '{name}' in pattern: {pattern}")]
	DuplicateParam {
		/// The repeated parameter name.
		name: String,
		/// The offending template.
		pattern: String,
	},

	/// The generated regular expression failed to compile.
	#[error("Failed to compile pattern regex: {0}")]
	Regex(String),
}

/// Error raised by the route identifier codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
	/// Encoded input lacks its discriminator or is otherwise malformed.
	#[error("Invalid encoding: {0}")]
	InvalidEncoding(String),

	/// A logical value that cannot be encoded.
	#[error("Invalid input: {0}")]
	InvalidInput(String),
}

/// Error raised while reading or writing the skip-list header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipHeaderError {
	/// The header value is not a JSON array of strings.
	#[error("Malformed skip header: {0}")]
	Malformed(String),
}

/// Error raised while parsing an href into route props.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid location '{href}': {source}")]
pub struct LocationError {
	/// The href that failed to parse.
	pub href: String,
	/// The underlying URL parse failure.
	#[source]
	pub source: url::ParseError,
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
