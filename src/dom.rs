//! The host DOM boundary.
//!
//! Backends report failed DOM operations through [`tracing`] and carry on, so a single
//! rejected mutation never aborts a walk.

use crate::vdom::{Attribute, Listener};
use core::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	Element,
	Text,
	Comment,
	/// Anything else (processing instructions, doctypes, …). Skipped when loading.
	Other,
}

/// What listeners receive when an event fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
	pub name: String,
}

/// A mutable DOM, as provided by the host environment.
///
/// The reconciler is the exclusive mutator of a mount point's subtree while it runs.
/// Nothing here can verify that, so callers must not touch that subtree concurrently.
pub trait Dom {
	/// Node handle. Equality is node identity.
	type Node: Clone + PartialEq + Debug;

	fn kind(&self, node: &Self::Node) -> NodeKind;

	/// [`None`] for non-elements. Case as reported by the backend.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;

	fn attributes(&self, node: &Self::Node) -> Vec<Attribute>;

	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

	fn remove_attribute(&mut self, node: &Self::Node, name: &str);

	/// Character data of text and comment nodes.
	fn data(&self, node: &Self::Node) -> Option<String>;

	fn set_data(&mut self, node: &Self::Node, data: &str);

	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

	/// [`None`] if the backend rejects the tag name.
	fn create_element(&mut self, tag: &str) -> Option<Self::Node>;

	fn create_text(&mut self, data: &str) -> Self::Node;

	fn create_comment(&mut self, data: &str) -> Self::Node;

	/// Inserts `child` before `reference`, or appends it if that is [`None`].
	/// A `child` that is already attached elsewhere is moved.
	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);

	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

	fn replace_child(&mut self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node);

	fn set_property(&mut self, node: &Self::Node, name: &str, value: &serde_json::Value);

	fn add_event_listener(&mut self, node: &Self::Node, listener: &Listener);

	fn remove_event_listener(&mut self, node: &Self::Node, listener: &Listener);
}
