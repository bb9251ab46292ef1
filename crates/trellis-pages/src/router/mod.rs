//! Client-side router runtime.
//!
//! - [`ClientRouter`]: the router context driving partial navigations
//! - [`skip_list`]: which cached components a navigation may reuse
//! - [`PrefetchMap`]: fetches started ahead of navigation, consumed once
//! - [`History`]: session history backends
//! - [`PopstateDecision`]: back/forward interception
//! - [`LinkActivation`]: which anchor clicks are handled in-app

mod core;
mod fetch;
mod history;
mod intercept;
mod link;
mod prefetch;
mod skip;

pub use self::core::{ClientRouter, NavigationOutcome};
pub use fetch::{FetchRequest, FetchResult, PayloadSignal, RscFetcher, WirePayload};
#[cfg(target_arch = "wasm32")]
pub use history::BrowserHistory;
pub use history::{History, MemoryHistory, NavigationType};
pub use intercept::{PopstateDecision, PopstateInterceptor, block_leaving};
pub use link::LinkActivation;
pub use prefetch::{PrefetchHandle, PrefetchMap};
pub use skip::skip_list;
