//! Prefix tree of layouts.
//!
//! Layouts are stored at the trie node reached by their path segments:
//! literal segments descend into a named child, groups into the single
//! dynamic child. Resolving the chain for a concrete path walks the trie
//! once, picking at most one layout per depth.

use crate::item::RouteItem;
use std::collections::HashMap;
use trellis_urls::pattern::PathSegment;

#[derive(Debug, Default, Clone)]
struct TrieNode {
	literal: HashMap<String, TrieNode>,
	dynamic: Option<Box<TrieNode>>,
	layouts: Vec<usize>,
}

/// Layouts indexed by path prefix.
#[derive(Debug, Default, Clone)]
pub struct LayoutTrie {
	root: TrieNode,
	items: Vec<RouteItem>,
}

impl LayoutTrie {
	/// Creates an empty trie.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a layout. The path must not contain a wildcard.
	pub(crate) fn insert(&mut self, item: RouteItem) {
		let index = self.items.len();
		let mut node = &mut self.root;
		for segment in item.path().segments() {
			node = match segment {
				PathSegment::Literal(text) => node.literal.entry(text.clone()).or_default(),
				PathSegment::Group(_) | PathSegment::Wildcard(_) => {
					&mut **node.dynamic.get_or_insert_with(Box::default)
				}
			};
		}
		node.layouts.push(index);
		self.items.push(item);
	}

	/// Returns the number of layouts.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Returns `true` if no layout is registered.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Iterates over layouts in registration order.
	pub fn iter(&self) -> impl Iterator<Item = &RouteItem> {
		self.items.iter()
	}

	/// Returns the layouts wrapping `segments`, outermost first, paired with
	/// the depth they apply at.
	///
	/// At each depth the layout with the most literal segments wins; among
	/// equally specific layouts the most recently registered wins. With
	/// `literal_only`, dynamic children are never followed.
	pub fn chain(&self, segments: &[&str], literal_only: bool) -> Vec<(usize, &RouteItem)> {
		let mut chain = Vec::new();
		let mut frontier: Vec<&TrieNode> = vec![&self.root];
		for depth in 0..=segments.len() {
			if depth > 0 {
				let segment = segments[depth - 1];
				frontier = frontier
					.into_iter()
					.flat_map(|node| {
						let literal = node.literal.get(segment);
						let dynamic = if literal_only {
							None
						} else {
							node.dynamic.as_deref()
						};
						literal.into_iter().chain(dynamic)
					})
					.collect();
				if frontier.is_empty() {
					break;
				}
			}
			let best = frontier
				.iter()
				.flat_map(|node| node.layouts.iter())
				.map(|&index| &self.items[index])
				.max_by_key(|item| (item.literal_count(), item.seq));
			if let Some(item) = best {
				chain.push((depth, item));
			}
		}
		chain
	}
}
