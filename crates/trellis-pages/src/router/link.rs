//! In-app link activation.

use trellis_urls::RouteProps;
use url::Url;

/// A click on an anchor, as reported by the DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkActivation {
	/// Resolved `href`, absolute or root-relative.
	pub href: String,
	/// Mouse button; `0` is the primary button.
	pub button: i16,
	/// Meta (command) key held.
	pub meta: bool,
	/// Control key held.
	pub ctrl: bool,
	/// Shift key held.
	pub shift: bool,
	/// Alt (option) key held.
	pub alt: bool,
	/// The anchor's `target` attribute.
	pub target: Option<String>,
	/// Whether the anchor has a `download` attribute.
	pub download: bool,
}

impl LinkActivation {
	/// A plain primary-button click on `href`.
	pub fn new(href: impl Into<String>) -> Self {
		Self {
			href: href.into(),
			..Self::default()
		}
	}

	/// Returns the location to navigate to when the click should be handled
	/// in-app, or `None` to leave it to the browser.
	///
	/// Modified clicks, non-primary buttons, foreign targets, downloads and
	/// cross-origin hrefs are left alone. `origin` is the document origin,
	/// e.g. `https://example.com`.
	pub fn in_app_target(&self, origin: &str) -> Option<RouteProps> {
		if self.button != 0 || self.meta || self.ctrl || self.shift || self.alt || self.download {
			return None;
		}
		if matches!(self.target.as_deref(), Some(t) if !t.is_empty() && t != "_self") {
			return None;
		}
		let base = Url::parse(origin).ok()?;
		let url = base.join(&self.href).ok()?;
		if url.origin() != base.origin() {
			return None;
		}
		RouteProps::parse(&self.href).ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const ORIGIN: &str = "https://example.com";

	#[rstest]
	fn test_plain_click() {
		let target = LinkActivation::new("/docs?page=2#intro")
			.in_app_target(ORIGIN)
			.unwrap();
		assert_eq!(target.to_href(), "/docs?page=2#intro");
	}

	#[rstest]
	fn test_same_origin_absolute() {
		let target = LinkActivation::new("https://example.com/a")
			.in_app_target(ORIGIN)
			.unwrap();
		assert_eq!(target.path, "/a");
	}

	#[rstest]
	#[case(LinkActivation { ctrl: true, ..LinkActivation::new("/a") })]
	#[case(LinkActivation { button: 1, ..LinkActivation::new("/a") })]
	#[case(LinkActivation { download: true, ..LinkActivation::new("/a") })]
	#[case(LinkActivation { target: Some("_blank".to_string()), ..LinkActivation::new("/a") })]
	#[case(LinkActivation::new("https://other.org/a"))]
	fn test_left_to_browser(#[case] activation: LinkActivation) {
		assert!(activation.in_app_target(ORIGIN).is_none());
	}
}
