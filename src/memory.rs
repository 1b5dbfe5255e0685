//! An arena-backed [`Dom`] for servers, tests and other hosts without a browser.

use crate::{
	dom::{Dom, DomEvent, NodeKind},
	vdom::{Attribute, Listener, VNode},
};
use hashbrown::HashMap;
use tracing::{error, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
enum Content {
	Element {
		tag: String,
		attributes: Vec<Attribute>,
		properties: HashMap<String, serde_json::Value>,
		listeners: Vec<Listener>,
	},
	Text(String),
	Comment(String),
}

#[derive(Debug)]
struct Slot {
	content: Content,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

/// Counts DOM mutations since creation or the last [`MemoryDom::reset_stats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MutationStats {
	pub created: usize,
	/// Nodes detached through [`Dom::remove_child`] or [`Dom::replace_child`] (not counting their descendants).
	pub removed: usize,
	pub inserted: usize,
	pub attribute_writes: usize,
	pub data_writes: usize,
}

/// Detached nodes stay allocated, so [`NodeId`]s never dangle.
#[derive(Debug, Default)]
pub struct MemoryDom {
	slots: Vec<Slot>,
	stats: MutationStats,
}

const VOID_ELEMENTS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn stats(&self) -> MutationStats {
		self.stats
	}

	pub fn reset_stats(&mut self) {
		self.stats = MutationStats::default()
	}

	pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
		self.insert_before(&parent, &child, None)
	}

	#[must_use]
	pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		match &self.slot(node).content {
			Content::Element { attributes, .. } => crate::vdom::attribute(attributes, name),
			Content::Text(_) | Content::Comment(_) => None,
		}
	}

	#[must_use]
	pub fn property(&self, node: NodeId, name: &str) -> Option<&serde_json::Value> {
		match &self.slot(node).content {
			Content::Element { properties, .. } => properties.get(name),
			Content::Text(_) | Content::Comment(_) => None,
		}
	}

	#[must_use]
	pub fn listener_count(&self, node: NodeId) -> usize {
		match &self.slot(node).content {
			Content::Element { listeners, .. } => listeners.len(),
			Content::Text(_) | Content::Comment(_) => 0,
		}
	}

	/// Calls each listener for `name` on `node` (no propagation) and returns how many ran.
	pub fn dispatch_event(&self, node: NodeId, name: &str) -> usize {
		let handlers: Vec<_> = match &self.slot(node).content {
			Content::Element { listeners, .. } => listeners.iter().filter(|l| l.event == name).map(|l| l.handler.clone()).collect(),
			Content::Text(_) | Content::Comment(_) => Vec::new(),
		};
		let event = DomEvent { name: name.to_owned() };
		for handler in &handlers {
			handler(&event)
		}
		handlers.len()
	}

	/// Whether `node` is `ancestor` or one of its descendants.
	#[must_use]
	pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut current = Some(node);
		while let Some(id) = current {
			if id == ancestor {
				return true;
			}
			current = self.slot(id).parent;
		}
		false
	}

	/// First element with `tag` in document order, including `root` itself.
	#[must_use]
	pub fn find_element(&self, root: NodeId, tag: &str) -> Option<NodeId> {
		if let Content::Element { tag: t, .. } = &self.slot(root).content {
			if t.eq_ignore_ascii_case(tag) {
				return Some(root);
			}
		}
		self.slot(root).children.iter().find_map(|&child| self.find_element(child, tag))
	}

	/// Builds plain DOM for a VDOM tree: elements, attributes, text and comments only.
	/// Components are not instantiated, and properties and listeners are skipped.
	pub fn materialize(&mut self, node: impl Into<VNode>) -> NodeId {
		self.materialize_node(&node.into())
	}

	fn materialize_node(&mut self, node: &VNode) -> NodeId {
		match node {
			VNode::Element(element) => {
				let id = self.push(Content::Element {
					tag: element.tag.clone(),
					attributes: element.attributes.clone(),
					properties: HashMap::new(),
					listeners: Vec::new(),
				});
				for child in &element.children {
					let child = self.materialize_node(child);
					self.append_child(id, child)
				}
				id
			}
			VNode::Text { data, .. } => self.push(Content::Text(data.clone())),
			VNode::Comment { data, .. } => self.push(Content::Comment(data.clone())),
		}
	}

	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		for &child in &self.slot(node).children {
			self.write_html(child, &mut html)
		}
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		let slot = self.slot(node);
		match &slot.content {
			Content::Element { tag, attributes, .. } => {
				html.push('<');
				html.push_str(tag);
				for Attribute { name, value } in attributes {
					html.push(' ');
					html.push_str(name);
					html.push_str("=\"");
					escape_into(value, true, html);
					html.push('"');
				}
				html.push('>');
				if VOID_ELEMENTS.contains(&tag.as_str()) {
					return;
				}
				for &child in &slot.children {
					self.write_html(child, html)
				}
				html.push_str("</");
				html.push_str(tag);
				html.push('>');
			}
			Content::Text(data) => escape_into(data, false, html),
			Content::Comment(data) => {
				html.push_str("<!--");
				html.push_str(data);
				html.push_str("-->");
			}
		}
	}

	fn push(&mut self, content: Content) -> NodeId {
		self.stats.created += 1;
		self.slots.push(Slot {
			content,
			parent: None,
			children: Vec::new(),
		});
		NodeId(self.slots.len() - 1)
	}

	fn slot(&self, node: NodeId) -> &Slot {
		&self.slots[node.0]
	}

	fn slot_mut(&mut self, node: NodeId) -> &mut Slot {
		&mut self.slots[node.0]
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.slot_mut(node).parent.take() {
			self.slot_mut(parent).children.retain(|&child| child != node);
		}
	}
}

fn escape_into(text: &str, attribute: bool, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' if attribute => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;

	fn kind(&self, node: &NodeId) -> NodeKind {
		match self.slot(*node).content {
			Content::Element { .. } => NodeKind::Element,
			Content::Text(_) => NodeKind::Text,
			Content::Comment(_) => NodeKind::Comment,
		}
	}

	fn tag_name(&self, node: &NodeId) -> Option<String> {
		match &self.slot(*node).content {
			Content::Element { tag, .. } => Some(tag.clone()),
			Content::Text(_) | Content::Comment(_) => None,
		}
	}

	fn attributes(&self, node: &NodeId) -> Vec<Attribute> {
		match &self.slot(*node).content {
			Content::Element { attributes, .. } => attributes.clone(),
			Content::Text(_) | Content::Comment(_) => Vec::new(),
		}
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		if let Content::Element { attributes, .. } = &mut self.slot_mut(*node).content {
			match attributes.iter_mut().find(|a| a.name == name) {
				Some(existing) => existing.value = value.to_owned(),
				None => attributes.push(Attribute::new(name, value)),
			}
			self.stats.attribute_writes += 1;
		} else {
			error!("Tried to set attribute {:?} on non-element {:?}", name, node)
		}
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		if let Content::Element { attributes, .. } = &mut self.slot_mut(*node).content {
			let before = attributes.len();
			attributes.retain(|a| a.name != name);
			if attributes.len() != before {
				self.stats.attribute_writes += 1;
			}
		}
	}

	fn data(&self, node: &NodeId) -> Option<String> {
		match &self.slot(*node).content {
			Content::Text(data) | Content::Comment(data) => Some(data.clone()),
			Content::Element { .. } => None,
		}
	}

	fn set_data(&mut self, node: &NodeId, new_data: &str) {
		match &mut self.slot_mut(*node).content {
			Content::Text(data) | Content::Comment(data) => {
				*data = new_data.to_owned();
				self.stats.data_writes += 1;
			}
			Content::Element { .. } => error!("Tried to set character data on element {:?}", node),
		}
	}

	fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
		self.slot(*node).children.clone()
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.slot(*node).parent
	}

	fn create_element(&mut self, tag: &str) -> Option<NodeId> {
		if tag.is_empty() || tag.contains(|c: char| c.is_whitespace() || c == '<' || c == '>' || c == '/') {
			error!("Invalid tag name {:?}", tag);
			return None;
		}
		Some(self.push(Content::Element {
			tag: tag.to_owned(),
			attributes: Vec::new(),
			properties: HashMap::new(),
			listeners: Vec::new(),
		}))
	}

	fn create_text(&mut self, data: &str) -> NodeId {
		self.push(Content::Text(data.to_owned()))
	}

	fn create_comment(&mut self, data: &str) -> NodeId {
		self.push(Content::Comment(data.to_owned()))
	}

	fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
		let (parent, child) = (*parent, *child);
		if self.contains(child, parent) {
			return error!("Refusing to insert {:?} into its own subtree at {:?}", child, parent);
		}
		if let Some(reference) = reference {
			if self.slot(*reference).parent != Some(parent) {
				return error!("Reference node {:?} is not a child of {:?}", reference, parent);
			}
		}
		self.detach(child);
		let index = match reference {
			Some(reference) => self.slot(parent).children.iter().position(|c| c == reference).unwrap_or_else(|| self.slot(parent).children.len()),
			None => self.slot(parent).children.len(),
		};
		self.slot_mut(parent).children.insert(index, child);
		self.slot_mut(child).parent = Some(parent);
		self.stats.inserted += 1;
		trace!("Inserted {:?} into {:?} at {}", child, parent, index);
	}

	fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
		if self.slot(*child).parent != Some(*parent) {
			return error!("Tried to remove {:?}, which is not a child of {:?}", child, parent);
		}
		self.detach(*child);
		self.stats.removed += 1;
	}

	fn replace_child(&mut self, parent: &NodeId, new_child: &NodeId, old_child: &NodeId) {
		if self.slot(*old_child).parent != Some(*parent) {
			return error!("Tried to replace {:?}, which is not a child of {:?}", old_child, parent);
		}
		self.insert_before(parent, new_child, Some(old_child));
		self.detach(*old_child);
		self.stats.removed += 1;
	}

	fn set_property(&mut self, node: &NodeId, name: &str, value: &serde_json::Value) {
		if let Content::Element { properties, .. } = &mut self.slot_mut(*node).content {
			properties.insert(name.to_owned(), value.clone());
		} else {
			error!("Tried to set property {:?} on non-element {:?}", name, node)
		}
	}

	fn add_event_listener(&mut self, node: &NodeId, listener: &Listener) {
		if let Content::Element { listeners, .. } = &mut self.slot_mut(*node).content {
			listeners.push(listener.clone());
		} else {
			error!("Tried to add {:?} listener to non-element {:?}", listener.event, node)
		}
	}

	fn remove_event_listener(&mut self, node: &NodeId, listener: &Listener) {
		if let Content::Element { listeners, .. } = &mut self.slot_mut(*node).content {
			match listeners.iter().position(|l| l == listener) {
				Some(index) => {
					listeners.remove(index);
				}
				None => error!("Tried to remove unknown {:?} listener from {:?}", listener.event, node),
			}
		}
	}
}
