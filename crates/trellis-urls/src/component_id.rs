//! Component identities.
//!
//! Every renderable unit of a composed route tree has a deterministic string
//! id derived from the concrete request path. The client uses these ids as
//! cache keys and the server uses them to omit already-fresh subtrees.

use crate::pattern::split_path;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Id of the root shell.
pub const ROOT_ID: &str = "root";

/// Path of the page rendered when nothing matches.
pub const NOT_FOUND_PATH: &str = "/404";

const SLICE_ID_PREFIX: &str = "slice:";

/// Deterministic key of one node of a composed route tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
	/// Wraps a raw id.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// The root shell id.
	pub fn root() -> Self {
		Self(ROOT_ID.to_string())
	}

	/// The id of the layout wrapping everything under `segments`.
	pub fn layout(segments: &[&str]) -> Self {
		Self(with_leaf(segments, "layout"))
	}

	/// The id of the page at `segments`.
	pub fn page(segments: &[&str]) -> Self {
		Self(with_leaf(segments, "page"))
	}

	/// The id of one part of the page at `segments`.
	pub fn page_part(segments: &[&str], order: u32) -> Self {
		Self(format!("{}:{}", with_leaf(segments, "page"), order))
	}

	/// The id of a slice.
	pub fn slice(slice_id: &str) -> Self {
		Self(format!("{}{}", SLICE_ID_PREFIX, slice_id))
	}

	/// The reserved id of the custom not-found page.
	pub fn not_found() -> Self {
		Self::page(&split_path(NOT_FOUND_PATH))
	}

	/// Returns the slice id if this identifies a slice.
	pub fn slice_id(&self) -> Option<&str> {
		self.0.strip_prefix(SLICE_ID_PREFIX)
	}

	/// Returns the id as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

fn with_leaf(segments: &[&str], leaf: &str) -> String {
	if segments.is_empty() {
		leaf.to_string()
	} else {
		format!("{}/{}", segments.join("/"), leaf)
	}
}

impl fmt::Display for ComponentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ComponentId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for ComponentId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl AsRef<str> for ComponentId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl Borrow<str> for ComponentId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

/// Derives the ids of the tree rendered for `path`.
///
/// The result is `root`, one layout id per prefix length (including the
/// empty and the full prefix), then the page id:
///
/// ```
/// use trellis_urls::component_ids;
///
/// let ids: Vec<String> = component_ids("/a/b").iter().map(|id| id.to_string()).collect();
/// assert_eq!(ids, ["root", "layout", "a/layout", "a/b/layout", "a/b/page"]);
/// ```
pub fn component_ids(path: &str) -> Vec<ComponentId> {
	let segments = split_path(path);
	let mut ids = Vec::with_capacity(segments.len() + 3);
	ids.push(ComponentId::root());
	for depth in 0..=segments.len() {
		ids.push(ComponentId::layout(&segments[..depth]));
	}
	ids.push(ComponentId::page(&segments));
	ids
}
