//! Render collaborator contract.

use crate::error::RenderError;
use crate::item::{ComponentRef, RenderMode};
use crate::resolver::ResolvedRoute;
use serde_json::Value;
use trellis_urls::ComponentId;

/// Renders components into opaque nodes.
pub trait Renderer {
	/// The rendered output.
	type Node;

	/// Renders `component` with `props`.
	fn render(&self, component: &ComponentRef, props: &Value) -> Result<Self::Node, RenderError>;

	/// Returns a precomputed node for a static component, if one exists.
	fn precomputed(&self, _id: &ComponentId) -> Option<Self::Node> {
		None
	}
}

/// One rendered entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEntry<N> {
	/// Component id.
	pub id: ComponentId,
	/// Render mode of the entry.
	pub render_mode: RenderMode,
	/// Rendered node.
	pub node: N,
}

/// Renders every entry of `route` in order.
///
/// Static entries are served from [`Renderer::precomputed`] when available.
///
/// # Errors
///
/// Returns the first [`RenderError`] raised by the renderer.
pub fn render_route<R>(
	route: &ResolvedRoute,
	renderer: &R,
) -> Result<Vec<RenderedEntry<R::Node>>, RenderError>
where
	R: Renderer + ?Sized,
{
	route
		.entries
		.iter()
		.map(|entry| {
			let precomputed = if entry.render_mode.is_static() {
				renderer.precomputed(&entry.id)
			} else {
				None
			};
			let node = match precomputed {
				Some(node) => node,
				None => renderer.render(&entry.component, &entry.props)?,
			};
			Ok(RenderedEntry {
				id: entry.id.clone(),
				render_mode: entry.render_mode,
				node,
			})
		})
		.collect()
}

impl ResolvedRoute {
	/// Renders this route with `renderer`.
	pub fn render<R>(&self, renderer: &R) -> Result<Vec<RenderedEntry<R::Node>>, RenderError>
	where
		R: Renderer + ?Sized,
	{
		render_route(self, renderer)
	}
}
