//! Skip-list computation.

use std::collections::HashMap;
use trellis_urls::{ComponentId, RouteProps, ShouldSkipConfig};

/// Returns the ids of `ids` whose cached render is still valid for `next`.
///
/// An id is skippable iff it has a cache entry, the server declared a
/// policy for it, and none of the policy's sensitivities changed between
/// the cached props and `next`.
pub fn skip_list(
	ids: &[ComponentId],
	next: &RouteProps,
	cache: &HashMap<ComponentId, RouteProps>,
	policies: &HashMap<ComponentId, ShouldSkipConfig>,
) -> Vec<ComponentId> {
	ids.iter()
		.filter(|id| match (cache.get(*id), policies.get(*id)) {
			(Some(cached), Some(policy)) => policy.is_fresh(cached, next),
			_ => false,
		})
		.cloned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use trellis_urls::component_ids;

	struct Fixture {
		cache: HashMap<ComponentId, RouteProps>,
		policies: HashMap<ComponentId, ShouldSkipConfig>,
	}

	#[fixture]
	fn cached_a() -> Fixture {
		let props = RouteProps::new("/a").with_param("q", "1");
		let cache = component_ids("/a")
			.into_iter()
			.map(|id| (id, props.clone()))
			.collect();
		let policies = HashMap::from([
			(ComponentId::root(), ShouldSkipConfig::always()),
			(ComponentId::new("layout"), ShouldSkipConfig::path_sensitive()),
			(
				ComponentId::new("a/page"),
				ShouldSkipConfig::path_sensitive().with_keys(["q"]),
			),
		]);
		Fixture { cache, policies }
	}

	fn skipped(f: &Fixture, next: &RouteProps) -> Vec<String> {
		skip_list(&component_ids(&next.path), next, &f.cache, &f.policies)
			.into_iter()
			.map(|id| id.to_string())
			.collect()
	}

	#[rstest]
	fn test_path_policy_ignores_query(cached_a: Fixture) {
		let next = RouteProps::new("/a").with_param("q", "1").with_param("x", "2");
		assert_eq!(skipped(&cached_a, &next), ["root", "layout", "a/page"]);
	}

	#[rstest]
	fn test_key_change_excludes(cached_a: Fixture) {
		let next = RouteProps::new("/a").with_param("q", "2");
		assert_eq!(skipped(&cached_a, &next), ["root", "layout"]);
	}

	#[rstest]
	fn test_uncached_and_unchecked_ids(cached_a: Fixture) {
		// `layout` is path-sensitive and the `b/*` ids were never cached.
		let next = RouteProps::new("/b");
		assert_eq!(skipped(&cached_a, &next), ["root"]);
	}
}
