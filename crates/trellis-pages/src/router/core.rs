//! Core client router.
//!
//! [`ClientRouter`] is the explicit router context owned by the UI root. It
//! tracks the displayed location, the skip-list cache, the elements received
//! so far and the server's reuse policies, and drives partial navigations
//! through an [`RscFetcher`].

use super::fetch::{FetchRequest, FetchResult, PayloadSignal, RscFetcher, WirePayload};
use super::history::{History, NavigationType};
use super::intercept::{PopstateDecision, PopstateInterceptor};
use super::link::LinkActivation;
use super::prefetch::{PrefetchHandle, PrefetchMap};
use super::skip::skip_list;
use crate::error::{RouterError, RouterResult};
use futures::FutureExt;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;
use trellis_conf::RouterSettings;
use trellis_urls::codec::route_wire_path;
use trellis_urls::component_id::NOT_FOUND_PATH;
use trellis_urls::{ComponentId, RouteProps, ShouldSkipConfig, component_ids};

/// How a navigation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
	/// A payload was fetched and applied.
	Applied,
	/// Every component was fresh; only the location changed.
	Skipped,
	/// Only the fragment changed.
	HashOnly,
	/// The custom not-found page is displayed; the URL is unchanged.
	NotFound,
	/// A newer navigation was applied first; this one was discarded.
	Superseded,
	/// The popstate interceptor cancelled the traversal.
	Blocked,
}

struct RouterState<N> {
	location: RouteProps,
	cache: HashMap<ComponentId, RouteProps>,
	policies: HashMap<ComponentId, ShouldSkipConfig>,
	elements: HashMap<ComponentId, N>,
	displayed: Vec<ComponentId>,
	prefetched: PrefetchMap<N>,
	next_generation: u64,
	applied_generation: u64,
	in_flight: BTreeSet<u64>,
}

impl<N: Clone> RouterState<N> {
	fn new(location: RouteProps) -> Self {
		Self {
			location,
			cache: HashMap::new(),
			policies: HashMap::new(),
			elements: HashMap::new(),
			displayed: Vec::new(),
			prefetched: PrefetchMap::new(),
			next_generation: 0,
			applied_generation: 0,
			in_flight: BTreeSet::new(),
		}
	}

	fn take_generation(&mut self) -> u64 {
		self.next_generation += 1;
		self.next_generation
	}

	fn is_stale(&self, generation: u64) -> bool {
		generation <= self.applied_generation
	}

	/// Ids of stored page parts and slices carried over when `id` is reused.
	fn attached_to(&self, id: &ComponentId) -> Vec<ComponentId> {
		let prefix = format!("{}:", id);
		let mut attached: Vec<ComponentId> = self
			.elements
			.keys()
			.filter(|key| key.as_str().starts_with(&prefix))
			.cloned()
			.collect();
		attached.sort();
		attached
	}

	fn displayed_slices(&self) -> Vec<ComponentId> {
		self.displayed
			.iter()
			.filter(|id| id.slice_id().is_some())
			.cloned()
			.collect()
	}

	/// Writes a payload for `target`, leaving `skip` as cached.
	fn apply(
		&mut self,
		generation: u64,
		target: &RouteProps,
		ids: &[ComponentId],
		skip: &[ComponentId],
		payload: WirePayload<N>,
	) {
		let WirePayload {
			elements,
			should_skip,
			..
		} = payload;

		for id in ids.iter().filter(|id| !skip.contains(id)) {
			match should_skip.get(id) {
				Some(policy) => {
					self.policies.insert(id.clone(), policy.clone());
				}
				None if elements.contains_key(id) || has_parts(&elements, id) => {
					self.policies.remove(id);
				}
				// No component at this id for `target`; remember the vacancy
				// for as long as the path stays the same.
				None => {
					self.policies
						.insert(id.clone(), ShouldSkipConfig::path_sensitive());
					self.elements.remove(id);
				}
			}
			self.cache.insert(id.clone(), target.clone());
		}

		let mut displayed = Vec::new();
		for id in ids {
			if skip.contains(id) {
				if self.elements.contains_key(id) {
					displayed.push(id.clone());
				}
				displayed.extend(self.attached_to(id));
			} else if elements.contains_key(id) {
				displayed.push(id.clone());
			}
		}
		for (id, node) in elements {
			if !ids.contains(&id) {
				match should_skip.get(&id) {
					Some(policy) => self.policies.insert(id.clone(), policy.clone()),
					None => self.policies.remove(&id),
				};
				self.cache.insert(id.clone(), target.clone());
				if !displayed.contains(&id) {
					displayed.push(id.clone());
				}
			}
			self.elements.insert(id, node);
		}

		self.location = target.clone();
		self.displayed = displayed;
		self.applied_generation = self.applied_generation.max(generation);
	}

	/// Moves to `target` without touching any component.
	fn apply_skipped(&mut self, generation: u64, target: &RouteProps, ids: &[ComponentId]) {
		let mut displayed = Vec::new();
		for id in ids {
			if self.elements.contains_key(id) {
				displayed.push(id.clone());
			}
			displayed.extend(self.attached_to(id));
		}
		for slice in self.displayed_slices() {
			if !displayed.contains(&slice) {
				displayed.push(slice);
			}
		}
		self.location = target.clone();
		self.displayed = displayed;
		self.applied_generation = self.applied_generation.max(generation);
	}

	/// Displays the custom not-found page carried by `payload`, or the cached
	/// one, inside the shell the client still holds for `skip`. Returns
	/// `false` when neither exists. The skip-list cache is not written.
	fn apply_not_found(
		&mut self,
		generation: u64,
		skip: &[ComponentId],
		payload: WirePayload<N>,
	) -> bool {
		let not_found = ComponentId::not_found();
		if !payload.elements.contains_key(&not_found) && !self.elements.contains_key(&not_found)
		{
			return false;
		}
		let received: Vec<ComponentId> = payload.elements.keys().cloned().collect();
		self.elements.extend(payload.elements);

		let mut displayed = Vec::new();
		for id in component_ids(NOT_FOUND_PATH) {
			let prefix = format!("{}:", id);
			let fresh: Vec<ComponentId> = received
				.iter()
				.filter(|key| **key == id || key.as_str().starts_with(&prefix))
				.cloned()
				.collect();
			if !fresh.is_empty() {
				displayed.extend(fresh);
			} else if skip.contains(&id) || id == not_found {
				if self.elements.contains_key(&id) {
					displayed.push(id.clone());
				}
				displayed.extend(self.attached_to(&id));
			}
		}
		for id in received {
			if !displayed.contains(&id) {
				displayed.push(id);
			}
		}
		self.displayed = displayed;
		self.applied_generation = self.applied_generation.max(generation);
		true
	}
}

/// Whether `elements` holds page parts of `id` (`<id>:<order>`).
fn has_parts<N>(elements: &BTreeMap<ComponentId, N>, id: &ComponentId) -> bool {
	let prefix = format!("{}:", id);
	elements
		.keys()
		.any(|key| key.as_str().starts_with(&prefix))
}

/// Removes a generation from the in-flight set when its navigation ends,
/// including when the navigation future is dropped.
struct InFlight<'a, N> {
	state: &'a RefCell<RouterState<N>>,
	generation: u64,
}

impl<N> Drop for InFlight<'_, N> {
	fn drop(&mut self) {
		self.state.borrow_mut().in_flight.remove(&self.generation);
	}
}

/// The client router context.
///
/// Navigation methods take `&self` so several navigations may be in flight
/// at once; a response is applied only if its generation is newer than the
/// last applied one. Borrows of the internal state are never held across an
/// await.
///
/// ```
/// use trellis_pages::router::{ClientRouter, FetchRequest, FetchResult, MemoryHistory, RscFetcher, WirePayload};
/// use trellis_conf::RouterSettings;
///
/// struct Echo;
///
/// #[async_trait::async_trait(?Send)]
/// impl RscFetcher for Echo {
/// 	type Node = String;
///
/// 	async fn fetch(&self, request: FetchRequest) -> FetchResult<String> {
/// 		Ok(WirePayload::new().with_element("root", request.props.path))
/// 	}
/// }
///
/// let router = ClientRouter::new(Echo, MemoryHistory::new("/"), RouterSettings::default());
/// assert_eq!(router.location().path, "/");
/// assert!(!router.is_pending());
/// ```
pub struct ClientRouter<F: RscFetcher, H: History> {
	fetcher: Rc<F>,
	history: RefCell<H>,
	state: RefCell<RouterState<F::Node>>,
	settings: RouterSettings,
	interceptor: RefCell<Option<PopstateInterceptor>>,
}

impl<F, H> std::fmt::Debug for ClientRouter<F, H>
where
	F: RscFetcher,
	H: History,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("ClientRouter")
			.field("location", &state.location.to_href())
			.field("displayed", &state.displayed)
			.field("cached", &state.cache.len())
			.field("prefetched", &state.prefetched.len())
			.field("applied_generation", &state.applied_generation)
			.field("has_interceptor", &self.interceptor.borrow().is_some())
			.finish()
	}
}

impl<F, H> ClientRouter<F, H>
where
	F: RscFetcher + 'static,
	H: History,
{
	/// Creates a router positioned at the history's current location.
	pub fn new(fetcher: F, history: H, settings: RouterSettings) -> Self {
		let location = history.location();
		Self {
			fetcher: Rc::new(fetcher),
			history: RefCell::new(history),
			state: RefCell::new(RouterState::new(location)),
			settings,
			interceptor: RefCell::new(None),
		}
	}

	/// Returns the fetcher.
	pub fn fetcher(&self) -> &F {
		&self.fetcher
	}

	/// Returns the router settings.
	pub fn settings(&self) -> &RouterSettings {
		&self.settings
	}

	/// Returns the displayed location.
	pub fn location(&self) -> RouteProps {
		self.state.borrow().location.clone()
	}

	/// Borrows the history backend.
	pub fn history(&self) -> Ref<'_, H> {
		self.history.borrow()
	}

	/// Mutably borrows the history backend, e.g. to simulate a traversal
	/// before calling [`handle_popstate`](Self::handle_popstate).
	pub fn history_mut(&self) -> RefMut<'_, H> {
		self.history.borrow_mut()
	}

	/// Returns `true` while a fetch newer than the displayed state is
	/// outstanding.
	pub fn is_pending(&self) -> bool {
		let state = self.state.borrow();
		state
			.in_flight
			.iter()
			.any(|generation| *generation > state.applied_generation)
	}

	/// Returns the stored element for `id`.
	pub fn element(&self, id: &str) -> Option<F::Node> {
		self.state.borrow().elements.get(id).cloned()
	}

	/// Returns the displayed elements, root first.
	pub fn current_elements(&self) -> Vec<(ComponentId, F::Node)> {
		let state = self.state.borrow();
		state
			.displayed
			.iter()
			.filter_map(|id| state.elements.get(id).map(|node| (id.clone(), node.clone())))
			.collect()
	}

	/// Returns the props `id` was last rendered for.
	pub fn cached_props(&self, id: &str) -> Option<RouteProps> {
		self.state.borrow().cache.get(id).cloned()
	}

	/// Returns the number of outstanding prefetches.
	pub fn prefetch_count(&self) -> usize {
		self.state.borrow().prefetched.len()
	}

	/// Installs the popstate interceptor, replacing any previous one.
	pub fn set_interceptor<I>(&self, interceptor: I)
	where
		I: Fn(&RouteProps, &RouteProps) -> PopstateDecision + 'static,
	{
		*self.interceptor.borrow_mut() = Some(Box::new(interceptor));
	}

	/// Removes the popstate interceptor.
	pub fn clear_interceptor(&self) {
		*self.interceptor.borrow_mut() = None;
	}

	/// Seeds the router with the server-rendered first view of `props`.
	pub fn hydrate(&self, props: RouteProps, payload: WirePayload<F::Node>) {
		let ids = component_ids(&props.path);
		let mut state = self.state.borrow_mut();
		let generation = state.take_generation();
		state.apply(generation, &props, &ids, &[], payload);
		debug_log!("hydrated {} with {} elements", props.to_href(), state.elements.len());
	}

	/// Drops every cached element, policy and prefetch, as a full reload
	/// would. Responses still in flight are discarded when they arrive.
	pub fn reset(&self) {
		let location = self.history.borrow().location();
		let mut state = self.state.borrow_mut();
		let mut fresh = RouterState::new(location);
		fresh.next_generation = state.next_generation;
		fresh.applied_generation = state.next_generation;
		fresh.in_flight = std::mem::take(&mut state.in_flight);
		*state = fresh;
	}

	/// Navigates to `href`, pushing a history entry.
	pub async fn push(&self, href: &str) -> RouterResult<NavigationOutcome> {
		let target = RouteProps::parse(href)?;
		self.navigate(target, NavigationType::Push).await
	}

	/// Navigates to `href`, replacing the current history entry.
	pub async fn replace(&self, href: &str) -> RouterResult<NavigationOutcome> {
		let target = RouteProps::parse(href)?;
		self.navigate(target, NavigationType::Replace).await
	}

	/// Handles an anchor click. Returns `None` when the click is left to the
	/// browser.
	pub async fn activate_link(
		&self,
		activation: &LinkActivation,
		origin: &str,
	) -> RouterResult<Option<NavigationOutcome>> {
		match activation.in_app_target(origin) {
			Some(target) => self
				.navigate(target, NavigationType::Push)
				.await
				.map(Some),
			None => Ok(None),
		}
	}

	/// Handles a back/forward traversal that already moved the history.
	pub async fn handle_popstate(&self) -> RouterResult<NavigationOutcome> {
		let traversed = self.history.borrow().location();
		let displayed = self.location();
		let decision = match self.interceptor.borrow().as_ref() {
			Some(interceptor) => interceptor(&displayed, &traversed),
			None => PopstateDecision::Allow,
		};
		match decision {
			PopstateDecision::Allow => self.navigate(traversed, NavigationType::Pop).await,
			PopstateDecision::Rewrite(target) => {
				debug_log!("popstate rewritten to {}", target.to_href());
				self.history.borrow_mut().replace(&target.to_href())?;
				self.navigate(target, NavigationType::Pop).await
			}
			PopstateDecision::Block => {
				debug_log!("popstate to {} blocked", traversed.to_href());
				self.history.borrow_mut().push(&displayed.to_href())?;
				Ok(NavigationOutcome::Blocked)
			}
		}
	}

	/// Starts fetching `href` ahead of navigation.
	///
	/// Returns `None` when the navigation would not fetch. The returned
	/// handle must be polled (e.g. spawned) for the fetch to make progress;
	/// the next navigation to the same wire URL consumes it.
	pub fn prefetch(&self, href: &str) -> RouterResult<Option<PrefetchHandle<F::Node>>> {
		let target = RouteProps::parse(href)?;
		let current = self.location();
		if target.same_document(&current) {
			return Ok(None);
		}
		let ids = component_ids(&target.path);
		let mut state = self.state.borrow_mut();
		let skip = skip_list(&ids, &target, &state.cache, &state.policies);
		if skip.len() == ids.len() {
			return Ok(None);
		}
		let request = self.request(&target, skip)?;
		let key = request.url();
		let fetcher = Rc::clone(&self.fetcher);
		let handle = state.prefetched.get_or_insert_with(&key, move || {
			async move { fetcher.fetch(request).await }
				.boxed_local()
				.shared()
		});
		debug_log!("prefetching {}", key);
		Ok(Some(handle))
	}

	fn request(&self, target: &RouteProps, skip: Vec<ComponentId>) -> RouterResult<FetchRequest> {
		let wire_path = route_wire_path(
			&self.settings.base_path,
			&self.settings.rsc_base,
			&target.path,
		)?;
		Ok(FetchRequest {
			wire_path,
			props: target.clone(),
			skip,
			skip_header: self.settings.skip_header.clone(),
		})
	}

	async fn fetch(&self, request: FetchRequest) -> FetchResult<F::Node> {
		let prefetched = self.state.borrow_mut().prefetched.take(&request.url());
		match prefetched {
			Some(handle) => {
				debug_log!("consuming prefetch for {}", request.url());
				handle.await
			}
			None => self.fetcher.fetch(request).await,
		}
	}

	fn update_history(&self, mode: NavigationType, target: &RouteProps) -> RouterResult<()> {
		let href = target.to_href();
		match mode {
			NavigationType::Push => self.history.borrow_mut().push(&href),
			NavigationType::Replace => self.history.borrow_mut().replace(&href),
			NavigationType::Pop => Ok(()),
		}
	}

	async fn navigate(
		&self,
		target: RouteProps,
		mode: NavigationType,
	) -> RouterResult<NavigationOutcome> {
		let generation = self.state.borrow_mut().take_generation();

		if target.same_document(&self.location()) {
			self.update_history(mode, &target)?;
			let mut state = self.state.borrow_mut();
			state.location = target;
			state.applied_generation = state.applied_generation.max(generation);
			return Ok(NavigationOutcome::HashOnly);
		}

		self.state.borrow_mut().in_flight.insert(generation);
		let _in_flight = InFlight {
			state: &self.state,
			generation,
		};

		let mut target = target;
		let mut mode = mode;
		let mut redirects = 0;
		loop {
			let ids = component_ids(&target.path);
			let skip = {
				let state = self.state.borrow();
				skip_list(&ids, &target, &state.cache, &state.policies)
			};

			if skip.len() == ids.len() {
				if self.state.borrow().is_stale(generation) {
					return Ok(NavigationOutcome::Superseded);
				}
				self.update_history(mode, &target)?;
				self.state
					.borrow_mut()
					.apply_skipped(generation, &target, &ids);
				debug_log!("navigated to {} without fetching", target.to_href());
				return Ok(NavigationOutcome::Skipped);
			}

			let request = self.request(&target, skip.clone())?;
			debug_log!("fetching {} skipping {:?}", request.url(), request.skip);
			let result = self.fetch(request).await;

			if self.state.borrow().is_stale(generation) {
				debug_log!("discarding stale response for {}", target.to_href());
				return Ok(NavigationOutcome::Superseded);
			}

			let payload = result.map_err(|err| {
				warn_log!("fetch for {} failed: {}", target.to_href(), err);
				RouterError::from(err)
			})?;

			match payload.signal.clone() {
				Some(PayloadSignal::Redirect { location }) => {
					redirects += 1;
					if redirects > self.settings.max_redirects {
						return Err(RouterError::TooManyRedirects {
							limit: self.settings.max_redirects,
							location,
						});
					}
					let next = RouteProps::parse(&location)?;
					debug_log!("{} redirects to {}", target.to_href(), next.to_href());
					if mode == NavigationType::Push {
						self.history.borrow_mut().push(&target.to_href())?;
					}
					self.history.borrow_mut().replace(&next.to_href())?;
					target = next;
					mode = NavigationType::Replace;
				}
				Some(PayloadSignal::NotFound { has_custom }) => {
					if has_custom
						&& self
							.state
							.borrow_mut()
							.apply_not_found(generation, &skip, payload)
					{
						info_log!("{} not found; showing custom page", target.to_href());
						return Ok(NavigationOutcome::NotFound);
					}
					return Err(RouterError::NotFound(target.path));
				}
				None => {
					self.update_history(mode, &target)?;
					self.state
						.borrow_mut()
						.apply(generation, &target, &ids, &skip, payload);
					return Ok(NavigationOutcome::Applied);
				}
			}
		}
	}
}
