//! Server rendering.
//!
//! Output follows the hydration contract: Each component host that also renders on the client
//! carries its state as JSON in [`STATE_ATTRIBUTE`], and preserved elements carry [`PRESERVE_ATTRIBUTE`].
//! Listeners and properties are client-only and not emitted.

use crate::{
	component::{render_template, scope_host, Template},
	dom::Dom,
	error::RenderError,
	memory::MemoryDom,
	vdom::{ComponentSlot, VElement, VNode},
	PRESERVE_ATTRIBUTE, STATE_ATTRIBUTE,
};
use tracing::{instrument, trace_span};

/// Renders `root` into a detached subtree of `dom` and returns its root node.
///
/// # Errors
///
/// Iff a component's state can't be serialized, or the backend rejects a tag name.
#[instrument(skip(dom, root))]
pub fn render_to_dom<D: Dom>(dom: &mut D, root: impl Into<VNode>) -> Result<D::Node, RenderError> {
	render_node(dom, root.into())
}

/// Renders `root` as HTML.
///
/// # Errors
///
/// See [`render_to_dom`].
pub fn render_to_string(root: impl Into<VNode>) -> Result<String, RenderError> {
	let mut dom = MemoryDom::new();
	let node = render_to_dom(&mut dom, root)?;
	Ok(dom.outer_html(node))
}

fn render_node<D: Dom>(dom: &mut D, node: VNode) -> Result<D::Node, RenderError> {
	match node {
		VNode::Element(element) => render_element(dom, element),
		VNode::Text { data, .. } => Ok(dom.create_text(&data)),
		VNode::Comment { data, .. } => Ok(dom.create_comment(&data)),
	}
}

fn render_element<D: Dom>(dom: &mut D, mut element: VElement) -> Result<D::Node, RenderError> {
	let span = trace_span!("render_element", tag = %element.tag);
	let _enter = span.enter();

	if let Some(ComponentSlot { definition, .. }) = element.component.take() {
		let capabilities = definition.capabilities();
		let instance = definition.create(&element.attributes);
		scope_host(&mut element, &*definition);
		if capabilities.renders_on_server {
			element.children = render_template(&*definition, &*instance, Template::Render);
			if capabilities.renders_on_client {
				let state = instance.serialize_state().map_err(|source| RenderError::State {
					tag: definition.tag().to_owned(),
					source,
				})?;
				element.set_attribute(STATE_ATTRIBUTE, state);
			}
		} else {
			element.children = render_template(&*definition, &*instance, Template::Placeholder);
		}
	}
	if element.preserve {
		element.set_attribute(PRESERVE_ATTRIBUTE, "");
	}

	let node = dom.create_element(&element.tag).ok_or_else(|| RenderError::CreateElement { tag: element.tag.clone() })?;
	for attribute in &element.attributes {
		dom.set_attribute(&node, &attribute.name, &attribute.value)
	}
	for child in element.children {
		let child = render_node(dom, child)?;
		dom.insert_before(&node, &child, None)
	}
	Ok(node)
}
