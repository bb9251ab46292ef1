//! Prefetched fetches keyed by wire URL.

use super::fetch::FetchResult;
use futures::future::{LocalBoxFuture, Shared};
use std::collections::HashMap;

/// A shared, possibly still running, fetch.
///
/// Awaiting a clone drives the underlying fetch; the navigation that later
/// consumes the entry observes the same result.
pub type PrefetchHandle<N> = Shared<LocalBoxFuture<'static, FetchResult<N>>>;

/// Prefetched fetches, consumed at most once.
pub struct PrefetchMap<N> {
	entries: HashMap<String, PrefetchHandle<N>>,
}

impl<N> Default for PrefetchMap<N> {
	fn default() -> Self {
		Self {
			entries: HashMap::new(),
		}
	}
}

impl<N: Clone> PrefetchMap<N> {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the entry for `key`, inserting the one built by `start` if absent.
	pub fn get_or_insert_with<F>(&mut self, key: &str, start: F) -> PrefetchHandle<N>
	where
		F: FnOnce() -> PrefetchHandle<N>,
	{
		self.entries
			.entry(key.to_string())
			.or_insert_with(start)
			.clone()
	}

	/// Removes and returns the entry for `key`.
	pub fn take(&mut self, key: &str) -> Option<PrefetchHandle<N>> {
		self.entries.remove(key)
	}

	/// Returns `true` if `key` has an entry.
	pub fn contains(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if there are no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Drops every entry.
	pub fn clear(&mut self) {
		self.entries.clear();
	}
}
