//! Browser history abstraction.
//!
//! [`MemoryHistory`] backs native targets and tests; [`BrowserHistory`]
//! drives `window.history` on WASM.

#[cfg(target_arch = "wasm32")]
use crate::error::RouterError;
use crate::error::RouterResult;
use trellis_urls::RouteProps;

/// How a navigation updates history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
	/// Push a new entry.
	Push,
	/// Replace the current entry.
	Replace,
	/// History already moved (back/forward); leave it alone.
	Pop,
}

/// A session history.
pub trait History {
	/// Returns the current location.
	fn location(&self) -> RouteProps;

	/// Pushes `href` as a new entry, dropping any forward entries.
	fn push(&mut self, href: &str) -> RouterResult<()>;

	/// Replaces the current entry with `href`.
	fn replace(&mut self, href: &str) -> RouterResult<()>;
}

/// In-memory history with back/forward traversal.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
	entries: Vec<String>,
	index: usize,
}

impl MemoryHistory {
	/// Creates a history holding a single entry.
	pub fn new(initial: &str) -> Self {
		Self {
			entries: vec![normalize_href(initial)],
			index: 0,
		}
	}

	/// Returns every entry in order.
	pub fn entries(&self) -> &[String] {
		&self.entries
	}

	/// Returns the current href.
	pub fn current(&self) -> &str {
		&self.entries[self.index]
	}

	/// Moves one entry back; returns `false` at the start.
	pub fn back(&mut self) -> bool {
		self.go(-1)
	}

	/// Moves one entry forward; returns `false` at the end.
	pub fn forward(&mut self) -> bool {
		self.go(1)
	}

	/// Moves by `delta` entries if the target exists.
	pub fn go(&mut self, delta: isize) -> bool {
		match self.index.checked_add_signed(delta) {
			Some(index) if index < self.entries.len() => {
				self.index = index;
				true
			}
			_ => false,
		}
	}
}

impl Default for MemoryHistory {
	fn default() -> Self {
		Self::new("/")
	}
}

impl History for MemoryHistory {
	fn location(&self) -> RouteProps {
		RouteProps::parse(self.current()).unwrap_or_default()
	}

	fn push(&mut self, href: &str) -> RouterResult<()> {
		self.entries.truncate(self.index + 1);
		self.entries.push(normalize_href(href));
		self.index += 1;
		Ok(())
	}

	fn replace(&mut self, href: &str) -> RouterResult<()> {
		self.entries[self.index] = normalize_href(href);
		Ok(())
	}
}

fn normalize_href(href: &str) -> String {
	RouteProps::parse(href)
		.map(|props| props.to_href())
		.unwrap_or_else(|_| href.to_string())
}

/// History backed by `window.history`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHistory;

#[cfg(target_arch = "wasm32")]
impl BrowserHistory {
	fn history() -> RouterResult<web_sys::History> {
		web_sys::window()
			.ok_or_else(|| RouterError::NavigationFailed("no window".to_string()))?
			.history()
			.map_err(|e| RouterError::NavigationFailed(format!("{:?}", e)))
	}
}

#[cfg(target_arch = "wasm32")]
impl History for BrowserHistory {
	fn location(&self) -> RouteProps {
		let Some(location) = web_sys::window().map(|w| w.location()) else {
			return RouteProps::default();
		};
		let href = format!(
			"{}{}{}",
			location.pathname().unwrap_or_default(),
			location.search().unwrap_or_default(),
			location.hash().unwrap_or_default()
		);
		RouteProps::parse(&href).unwrap_or_default()
	}

	fn push(&mut self, href: &str) -> RouterResult<()> {
		Self::history()?
			.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(href))
			.map_err(|e| RouterError::NavigationFailed(format!("{:?}", e)))
	}

	fn replace(&mut self, href: &str) -> RouterResult<()> {
		Self::history()?
			.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(href))
			.map_err(|e| RouterError::NavigationFailed(format!("{:?}", e)))
	}
}
