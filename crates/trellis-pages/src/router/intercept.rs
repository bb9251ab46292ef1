//! Popstate interception.

use trellis_urls::RouteProps;

/// What to do with a back/forward traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopstateDecision {
	/// Navigate to the traversed location.
	Allow,
	/// Navigate to another location, replacing the traversed entry.
	Rewrite(RouteProps),
	/// Stay on the displayed location.
	Block,
}

/// Decides a popstate from `(displayed, traversed)` locations.
pub type PopstateInterceptor = Box<dyn Fn(&RouteProps, &RouteProps) -> PopstateDecision>;

/// Builds an interceptor that blocks traversals leaving `path` while
/// `guard` returns `true`.
///
/// ```
/// use trellis_pages::router::{block_leaving, PopstateDecision};
/// use trellis_urls::RouteProps;
///
/// let interceptor = block_leaving("/editor", || true);
/// let decision = interceptor(&RouteProps::new("/editor"), &RouteProps::new("/"));
/// assert_eq!(decision, PopstateDecision::Block);
/// ```
pub fn block_leaving<G>(path: &str, guard: G) -> PopstateInterceptor
where
	G: Fn() -> bool + 'static,
{
	let path = RouteProps::new(path).path;
	Box::new(move |from, to| {
		if from.path == path && to.path != path && guard() {
			PopstateDecision::Block
		} else {
			PopstateDecision::Allow
		}
	})
}
