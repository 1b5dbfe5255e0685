//! Reads a live DOM subtree into a bound VDOM tree (the server-side VDOM, when hydrating).

use crate::{
	config::HydrationOptions,
	dom::{Dom, NodeKind},
	redact,
	vdom::{Attribute, VElement, VNode},
	PRESERVE_ATTRIBUTE,
};
use tracing::{error, instrument, warn};

/// [`None`] for node kinds other than elements, text and comments.
///
/// Whitespace-only text is loaded too. Whether it takes part in hydration is up to the reconciler.
#[instrument(skip(dom, options))]
pub fn load_node<D: Dom>(dom: &D, node: &D::Node, options: &HydrationOptions) -> Option<VNode<D::Node>> {
	load_at_depth(dom, node, options, options.depth_limit)
}

fn load_at_depth<D: Dom>(dom: &D, node: &D::Node, options: &HydrationOptions, depth_limit: usize) -> Option<VNode<D::Node>> {
	match dom.kind(node) {
		NodeKind::Element => load_element_at_depth(dom, node, options, depth_limit).map(VNode::Element),
		NodeKind::Text => Some(VNode::Text {
			data: dom.data(node).unwrap_or_default(),
			binding: node.clone(),
		}),
		NodeKind::Comment => Some(VNode::Comment {
			data: dom.data(node).unwrap_or_default(),
			binding: node.clone(),
		}),
		NodeKind::Other => {
			warn!("Skipping unrecognised node {:?}", node);
			None
		}
	}
}

/// [`None`] if `element` is not an element.
pub fn load_element<D: Dom>(dom: &D, element: &D::Node, options: &HydrationOptions) -> Option<VElement<D::Node>> {
	load_element_at_depth(dom, element, options, options.depth_limit)
}

fn load_element_at_depth<D: Dom>(dom: &D, element: &D::Node, options: &HydrationOptions, depth_limit: usize) -> Option<VElement<D::Node>> {
	let tag = dom.tag_name(element)?.to_ascii_lowercase();
	let attributes = load_attributes(dom, element);
	let preserve = attributes.iter().any(|a| a.name == PRESERVE_ATTRIBUTE);
	let children = if depth_limit == 0 {
		error!("Depth limit reached while loading <{}>; Its content is not loaded.", tag);
		Vec::new()
	} else {
		load_child_nodes(dom, element, options, depth_limit - 1)
	};
	Some(VElement {
		tag,
		attributes,
		children,
		component: None,
		properties: Vec::new(),
		listeners: Vec::new(),
		preserve,
		is_static: false,
		binding: element.clone(),
	})
}

fn load_child_nodes<D: Dom>(dom: &D, parent: &D::Node, options: &HydrationOptions, depth_limit: usize) -> Vec<VNode<D::Node>> {
	dom.child_nodes(parent)
		.iter()
		.filter_map(|child| load_at_depth(dom, child, options, depth_limit))
		.collect()
}

/// Attribute names are lower-cased. Later duplicates are dropped.
pub fn load_attributes<D: Dom>(dom: &D, element: &D::Node) -> Vec<Attribute> {
	let mut attributes: Vec<Attribute> = Vec::new();
	for Attribute { name, value } in dom.attributes(element) {
		let name = name.to_ascii_lowercase();
		if attributes.iter().any(|a| a.name == name) {
			warn!("Dropping duplicate attribute {:?}={:?}", name, redact(&value));
			continue;
		}
		attributes.push(Attribute { name, value })
	}
	attributes
}
