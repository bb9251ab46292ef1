//! Registration descriptors.
//!
//! Each descriptor is a plain value handed to one of the
//! [`Registry`](crate::Registry) `register_*` methods. Builders set the
//! optional, kind-specific fields.

use crate::api::ApiHandler;
use crate::item::{ComponentRef, GetConfig, PageConfig, RenderMode};
use std::sync::Arc;
use trellis_urls::ShouldSkipConfig;

/// A page.
#[derive(Clone)]
pub struct PageDescriptor {
	/// Path template.
	pub path: String,
	/// Declared render mode.
	pub render: Option<RenderMode>,
	/// Component rendered for the page.
	pub component: ComponentRef,
	/// Values for the dynamic segments of a static page.
	pub static_paths: Vec<Vec<String>>,
	/// Treat every segment as literal and skip layouts at dynamic prefixes.
	pub exact_path: bool,
	/// Slices the page renders, in order.
	pub slices: Vec<String>,
	/// Reuse policy for clients.
	pub should_skip: Option<ShouldSkipConfig>,
	/// Configuration consulted when no render mode is declared.
	pub get_config: Option<Arc<dyn GetConfig>>,
}

impl PageDescriptor {
	/// Creates a page descriptor.
	pub fn new(path: impl Into<String>, component: impl Into<ComponentRef>) -> Self {
		Self {
			path: path.into(),
			render: None,
			component: component.into(),
			static_paths: Vec::new(),
			exact_path: false,
			slices: Vec::new(),
			should_skip: None,
			get_config: None,
		}
	}

	/// Declares the render mode.
	pub fn render(mut self, mode: RenderMode) -> Self {
		self.render = Some(mode);
		self
	}

	/// Adds one static path entry.
	pub fn static_path<I, S>(mut self, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.static_paths
			.push(values.into_iter().map(Into::into).collect());
		self
	}

	/// Marks the path as exact.
	pub fn exact(mut self) -> Self {
		self.exact_path = true;
		self
	}

	/// Declares the slices the page renders.
	pub fn slices<I, S>(mut self, ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.slices.extend(ids.into_iter().map(Into::into));
		self
	}

	/// Declares the reuse policy.
	pub fn should_skip(mut self, policy: ShouldSkipConfig) -> Self {
		self.should_skip = Some(policy);
		self
	}

	/// Sets the configuration collaborator.
	pub fn get_config<F>(mut self, config: F) -> Self
	where
		F: Fn() -> PageConfig + Send + Sync + 'static,
	{
		self.get_config = Some(Arc::new(config));
		self
	}
}

/// A layout.
#[derive(Debug, Clone)]
pub struct LayoutDescriptor {
	/// Path template; wildcards are not allowed.
	pub path: String,
	/// Render mode.
	pub render: RenderMode,
	/// Component wrapping the nested tree.
	pub component: ComponentRef,
	/// Reuse policy for clients.
	pub should_skip: Option<ShouldSkipConfig>,
}

impl LayoutDescriptor {
	/// Creates a layout descriptor.
	pub fn new(
		path: impl Into<String>,
		render: RenderMode,
		component: impl Into<ComponentRef>,
	) -> Self {
		Self {
			path: path.into(),
			render,
			component: component.into(),
			should_skip: None,
		}
	}

	/// Declares the reuse policy.
	pub fn should_skip(mut self, policy: ShouldSkipConfig) -> Self {
		self.should_skip = Some(policy);
		self
	}
}

/// The root shell.
#[derive(Debug, Clone)]
pub struct RootDescriptor {
	/// Render mode.
	pub render: RenderMode,
	/// Component rendering the document shell.
	pub component: ComponentRef,
	/// Reuse policy for clients.
	pub should_skip: Option<ShouldSkipConfig>,
}

impl RootDescriptor {
	/// Creates a root descriptor.
	pub fn new(render: RenderMode, component: impl Into<ComponentRef>) -> Self {
		Self {
			render,
			component: component.into(),
			should_skip: None,
		}
	}

	/// Declares the reuse policy.
	pub fn should_skip(mut self, policy: ShouldSkipConfig) -> Self {
		self.should_skip = Some(policy);
		self
	}
}

/// An API endpoint.
///
/// Exactly one of the single-method form (`method` + `handler`) or the map
/// form (`handlers`) must be supplied.
#[derive(Clone)]
pub struct ApiDescriptor {
	/// Path template.
	pub path: String,
	/// Render mode.
	pub render: RenderMode,
	/// Method of the single-method form.
	pub method: Option<String>,
	/// Handler of the single-method form.
	pub handler: Option<Arc<dyn ApiHandler>>,
	/// Handlers keyed by method name.
	pub handlers: Option<Vec<(String, Arc<dyn ApiHandler>)>>,
	/// Values for the dynamic segments of a static endpoint.
	pub static_paths: Vec<Vec<String>>,
}

impl ApiDescriptor {
	/// Creates an API descriptor with no handlers yet.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			render: RenderMode::Dynamic,
			method: None,
			handler: None,
			handlers: None,
			static_paths: Vec::new(),
		}
	}

	/// Sets the render mode.
	pub fn render(mut self, mode: RenderMode) -> Self {
		self.render = mode;
		self
	}

	/// Uses the single-method form.
	pub fn method(mut self, method: impl Into<String>, handler: Arc<dyn ApiHandler>) -> Self {
		self.method = Some(method.into());
		self.handler = Some(handler);
		self
	}

	/// Adds one entry of the map form.
	pub fn handler(mut self, method: impl Into<String>, handler: Arc<dyn ApiHandler>) -> Self {
		self.handlers
			.get_or_insert_with(Vec::new)
			.push((method.into(), handler));
		self
	}

	/// Adds one static path entry.
	pub fn static_path<I, S>(mut self, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.static_paths
			.push(values.into_iter().map(Into::into).collect());
		self
	}
}

/// An independently fetchable slice.
#[derive(Debug, Clone)]
pub struct SliceDescriptor {
	/// Slice id.
	pub id: String,
	/// Render mode.
	pub render: RenderMode,
	/// Component rendering the slice.
	pub component: ComponentRef,
	/// Reuse policy for clients.
	pub should_skip: Option<ShouldSkipConfig>,
}

impl SliceDescriptor {
	/// Creates a slice descriptor.
	pub fn new(
		id: impl Into<String>,
		render: RenderMode,
		component: impl Into<ComponentRef>,
	) -> Self {
		Self {
			id: id.into(),
			render,
			component: component.into(),
			should_skip: None,
		}
	}

	/// Declares the reuse policy.
	pub fn should_skip(mut self, policy: ShouldSkipConfig) -> Self {
		self.should_skip = Some(policy);
		self
	}
}

/// One part of a page.
#[derive(Debug, Clone)]
pub struct PagePartDescriptor {
	/// Path template of the page.
	pub path: String,
	/// Render mode of this part.
	pub render: RenderMode,
	/// Component rendering this part.
	pub component: ComponentRef,
	/// Composition order.
	pub order: u32,
	/// Values for the dynamic segments of a static part.
	pub static_paths: Vec<Vec<String>>,
	/// Reuse policy for clients.
	pub should_skip: Option<ShouldSkipConfig>,
}

impl PagePartDescriptor {
	/// Creates a page part descriptor.
	pub fn new(
		path: impl Into<String>,
		render: RenderMode,
		component: impl Into<ComponentRef>,
		order: u32,
	) -> Self {
		Self {
			path: path.into(),
			render,
			component: component.into(),
			order,
			static_paths: Vec::new(),
			should_skip: None,
		}
	}

	/// Adds one static path entry.
	pub fn static_path<I, S>(mut self, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.static_paths
			.push(values.into_iter().map(Into::into).collect());
		self
	}

	/// Declares the reuse policy.
	pub fn should_skip(mut self, policy: ShouldSkipConfig) -> Self {
		self.should_skip = Some(policy);
		self
	}
}
