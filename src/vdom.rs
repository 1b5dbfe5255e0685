//! Virtual DOM nodes, for both client templates and trees bound to a live DOM.
//!
//! The binding parameter `B` distinguishes the two: client templates use `()`,
//! while trees [loaded](`crate::load`) from or reconciled against a [`Dom`](`crate::dom::Dom`)
//! carry that backend's node handle on every node.

use crate::{
	component::{Component, ComponentDefinition, ComponentInstance, Definition},
	dom::DomEvent,
};
use core::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;

/// A single HTML attribute. Attribute names are unique within one [`VElement`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
	pub name: String,
	pub value: String,
}

impl Attribute {
	#[must_use]
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
		}
	}
}

/// Looks up an attribute value by name.
#[must_use]
pub fn attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
	attributes.iter().find(|a| a.name == name).map(|a| a.value.as_str())
}

/// A non-serializable DOM property, set on the live node but never present in server output.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
	pub name: String,
	pub value: serde_json::Value,
}

pub type Handler = Rc<dyn Fn(&DomEvent)>;

/// An event listener binding. Two bindings are equal if they listen to the same event with the same handler allocation.
#[derive(Clone)]
pub struct Listener {
	pub event: String,
	pub handler: Handler,
}

impl PartialEq for Listener {
	fn eq(&self, other: &Self) -> bool {
		self.event == other.event && Rc::as_ptr(&self.handler).cast::<()>() == Rc::as_ptr(&other.handler).cast::<()>()
	}
}

impl Debug for Listener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Listener")
			.field("event", &self.event)
			.field("handler", &Rc::as_ptr(&self.handler).cast::<()>())
			.finish()
	}
}

/// Marks an element as a component host.
pub struct ComponentSlot {
	pub(crate) definition: Rc<dyn ComponentDefinition>,
	pub(crate) instance: Option<Box<dyn ComponentInstance>>,
}

impl ComponentSlot {
	#[must_use]
	pub fn new(definition: Rc<dyn ComponentDefinition>) -> Self {
		Self { definition, instance: None }
	}

	#[must_use]
	pub fn definition(&self) -> &Rc<dyn ComponentDefinition> {
		&self.definition
	}

	/// The constructed instance, if this slot belongs to a live tree and the component renders on the client.
	#[must_use]
	pub fn instance(&self) -> Option<&dyn ComponentInstance> {
		self.instance.as_deref()
	}

	pub fn instance_mut(&mut self) -> Option<&mut (dyn ComponentInstance + 'static)> {
		self.instance.as_deref_mut()
	}
}

impl Debug for ComponentSlot {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentSlot")
			.field("tag", &self.definition.tag())
			.field("instance", &self.instance)
			.finish()
	}
}

#[derive(Debug)]
pub struct VElement<B = ()> {
	/// Always lower-case.
	pub tag: String,
	pub attributes: Vec<Attribute>,
	pub children: Vec<VNode<B>>,
	pub component: Option<ComponentSlot>,
	pub properties: Vec<Property>,
	pub listeners: Vec<Listener>,
	/// Server content under this element survives all client renders untouched.
	pub preserve: bool,
	/// Produced identically on server and client, so patching it is a no-op.
	pub is_static: bool,
	pub binding: B,
}

#[derive(Debug)]
pub enum VNode<B = ()> {
	Element(VElement<B>),
	Text { data: String, binding: B },
	Comment { data: String, binding: B },
}

impl VNode {
	#[must_use]
	pub fn element(tag: &str) -> VElement {
		VElement::new(tag)
	}

	#[must_use]
	pub fn text(data: impl Into<String>) -> Self {
		Self::Text {
			data: data.into(),
			binding: (),
		}
	}

	#[must_use]
	pub fn comment(data: impl Into<String>) -> Self {
		Self::Comment {
			data: data.into(),
			binding: (),
		}
	}

	/// A host element for `C` without stylesheet. Use [`VNode::host`] to share a styled [`Definition`].
	#[must_use]
	pub fn component<C: Component>() -> VElement {
		Self::host(Definition::<C>::new().shared())
	}

	#[must_use]
	pub fn host(definition: Rc<dyn ComponentDefinition>) -> VElement {
		let mut element = VElement::new(definition.tag());
		element.component = Some(ComponentSlot::new(definition));
		element
	}
}

impl<B> VNode<B> {
	#[must_use]
	pub fn binding(&self) -> &B {
		match self {
			VNode::Element(element) => &element.binding,
			VNode::Text { binding, .. } | VNode::Comment { binding, .. } => binding,
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&VElement<B>> {
		match self {
			VNode::Element(element) => Some(element),
			VNode::Text { .. } | VNode::Comment { .. } => None,
		}
	}

	/// Short structural description (`<div>`, `#text`, `#comment`), free of page content.
	#[must_use]
	pub fn describe(&self) -> String {
		match self {
			VNode::Element(element) => format!("<{}>", element.tag),
			VNode::Text { .. } => "#text".to_owned(),
			VNode::Comment { .. } => "#comment".to_owned(),
		}
	}

	/// Concatenated text of this subtree.
	#[must_use]
	pub fn text_content(&self) -> String {
		let mut text = String::new();
		self.collect_text(&mut text);
		text
	}

	fn collect_text(&self, text: &mut String) {
		match self {
			VNode::Element(element) => {
				for child in &element.children {
					child.collect_text(text)
				}
			}
			VNode::Text { data, .. } => text.push_str(data),
			VNode::Comment { .. } => (),
		}
	}

	/// Whether both nodes have the same kind and tag, recursively.
	pub(crate) fn same_shape<C>(&self, other: &VNode<C>) -> bool {
		match (self, other) {
			(VNode::Element(a), VNode::Element(b)) => a.same_shape(b),
			(VNode::Text { .. }, VNode::Text { .. }) | (VNode::Comment { .. }, VNode::Comment { .. }) => true,
			_ => false,
		}
	}
}

impl<B: Clone> VNode<B> {
	pub(crate) fn shell(&self) -> VNode<B> {
		match self {
			VNode::Element(element) => VNode::Element(element.shell()),
			VNode::Text { data, binding } => VNode::Text {
				data: data.clone(),
				binding: binding.clone(),
			},
			VNode::Comment { data, binding } => VNode::Comment {
				data: data.clone(),
				binding: binding.clone(),
			},
		}
	}
}

impl From<VElement> for VNode {
	fn from(element: VElement) -> Self {
		Self::Element(element)
	}
}

impl VElement {
	#[must_use]
	pub fn new(tag: &str) -> Self {
		Self {
			tag: tag.to_ascii_lowercase(),
			attributes: Vec::new(),
			children: Vec::new(),
			component: None,
			properties: Vec::new(),
			listeners: Vec::new(),
			preserve: false,
			is_static: false,
			binding: (),
		}
	}

	#[must_use]
	pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
		self.set_attribute(name, value);
		self
	}

	#[must_use]
	pub fn class(mut self, class: &str) -> Self {
		self.add_class(class);
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<VNode>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
		self.children.extend(children);
		self
	}

	#[must_use]
	pub fn text(self, data: impl Into<String>) -> Self {
		self.child(VNode::text(data))
	}

	#[must_use]
	pub fn property(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		let name = name.into();
		let value = value.into();
		match self.properties.iter_mut().find(|p| p.name == name) {
			Some(existing) => existing.value = value,
			None => self.properties.push(Property { name, value }),
		}
		self
	}

	#[must_use]
	pub fn on(self, event: impl Into<String>, handler: impl Fn(&DomEvent) + 'static) -> Self {
		self.listen(event, Rc::new(handler))
	}

	/// Like [`VElement::on`], but with a shared handler so that re-renders can keep the listener attached.
	#[must_use]
	pub fn listen(mut self, event: impl Into<String>, handler: Handler) -> Self {
		self.listeners.push(Listener { event: event.into(), handler });
		self
	}

	#[must_use]
	pub fn preserved(mut self) -> Self {
		self.preserve = true;
		self
	}

	#[must_use]
	pub fn static_content(mut self) -> Self {
		self.is_static = true;
		self
	}
}

impl<B> VElement<B> {
	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&str> {
		attribute(&self.attributes, name)
	}

	pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
		let value = value.into();
		match self.attributes.iter_mut().find(|a| a.name == name) {
			Some(existing) => existing.value = value,
			None => self.attributes.push(Attribute::new(name, value)),
		}
	}

	pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
		let index = self.attributes.iter().position(|a| a.name == name)?;
		Some(self.attributes.remove(index).value)
	}

	#[must_use]
	pub fn has_class(&self, class: &str) -> bool {
		self.attribute("class").map_or(false, |classes| classes.split_ascii_whitespace().any(|c| c == class))
	}

	/// Appends `class` to the `class` attribute unless already present.
	pub fn add_class(&mut self, class: &str) {
		if self.has_class(class) {
			return;
		}
		let classes = match self.attribute("class") {
			Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim_end(), class),
			_ => class.to_owned(),
		};
		self.set_attribute("class", classes)
	}

	/// The constructed component instance of this host element, if any.
	#[must_use]
	pub fn instance(&self) -> Option<&dyn ComponentInstance> {
		self.component.as_ref()?.instance()
	}

	pub(crate) fn same_shape<C>(&self, other: &VElement<C>) -> bool {
		self.tag == other.tag && self.children.len() == other.children.len() && self.children.iter().zip(&other.children).all(|(a, b)| a.same_shape(b))
	}
}

impl<B: Clone> VElement<B> {
	/// A childless copy of this element's identity, used where subtrees are never diffed again.
	pub(crate) fn shell(&self) -> VElement<B> {
		VElement {
			tag: self.tag.clone(),
			attributes: self.attributes.clone(),
			children: Vec::new(),
			component: None,
			properties: Vec::new(),
			listeners: Vec::new(),
			preserve: self.preserve,
			is_static: self.is_static,
			binding: self.binding.clone(),
		}
	}
}

/// Child-index path from a mount root. Keys preserved subtrees and locates mismatches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
	#[must_use]
	pub fn root() -> Self {
		Self(Vec::new())
	}

	#[must_use]
	pub fn child(&self, index: usize) -> Self {
		let mut indices = Vec::with_capacity(self.0.len() + 1);
		indices.extend_from_slice(&self.0);
		indices.push(index);
		Self(indices)
	}

	#[must_use]
	pub fn indices(&self) -> &[usize] {
		&self.0
	}

	#[must_use]
	pub fn depth(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn starts_with(&self, ancestor: &NodePath) -> bool {
		self.0.starts_with(&ancestor.0)
	}
}

impl From<Vec<usize>> for NodePath {
	fn from(indices: Vec<usize>) -> Self {
		Self(indices)
	}
}

impl Display for NodePath {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return f.write_str("/");
		}
		for index in &self.0 {
			write!(f, "/{}", index)?;
		}
		Ok(())
	}
}
