//! Client router errors.

use thiserror::Error;
use trellis_urls::{CodecError, LocationError, SkipHeaderError};

/// A failed component fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FetchError(pub String);

impl FetchError {
	/// Creates a fetch error from any message.
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// Errors surfaced by client navigation.
///
/// A failed navigation never writes to the skip-list cache, so retrying it
/// fetches again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
	/// The server reported no route and no custom not-found page is known.
	#[error("Route not found: {0}")]
	NotFound(String),

	/// The history backend rejected an update.
	#[error("Navigation failed: {0}")]
	NavigationFailed(String),

	/// The component fetch failed.
	#[error("Fetch failed: {0}")]
	Fetch(#[from] FetchError),

	/// A wire path could not be built.
	#[error(transparent)]
	Codec(#[from] CodecError),

	/// The skip header could not be serialized.
	#[error(transparent)]
	SkipHeader(#[from] SkipHeaderError),

	/// Redirects did not settle within the configured limit.
	#[error("Too many redirects ({limit}) while navigating to {location}")]
	TooManyRedirects {
		/// Configured limit.
		limit: u32,
		/// Last redirect target.
		location: String,
	},

	/// An href could not be parsed.
	#[error(transparent)]
	InvalidLocation(#[from] LocationError),
}

/// Result alias for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_display() {
		assert_eq!(
			RouterError::NotFound("/x".to_string()).to_string(),
			"Route not found: /x"
		);
		assert_eq!(
			RouterError::from(FetchError::new("offline")).to_string(),
			"Fetch failed: offline"
		);
		let err = RouterError::TooManyRedirects {
			limit: 2,
			location: "/loop".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"Too many redirects (2) while navigating to /loop"
		);
	}
}
