//! A browser [`Dom`], backed by [`web_sys`].

use crate::{
	dom::{Dom, DomEvent, NodeKind},
	vdom::{Attribute, Listener},
};
use core::fmt::{self, Debug, Formatter};
use js_sys::{Reflect, JSON};
use tracing::{error, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CharacterData, Document, Element, Node};

struct BoundListener {
	node: Node,
	listener: Listener,
	closure: Closure<dyn Fn(web_sys::Event)>,
}

/// Keeps each attached listener's closure alive until its node leaves the DOM through this instance.
///
/// Listeners that are still attached when this is dropped start throwing into JavaScript when their event fires.
pub struct WebDom {
	document: Document,
	listeners: Vec<BoundListener>,
}

impl Debug for WebDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebDom")
			.field("document", &self.document)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			listeners: Vec::new(),
		}
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Detaches and frees the listeners of `removed`'s subtree.
	fn release_listeners(&mut self, removed: &Node) {
		let before = self.listeners.len();
		self.listeners.retain(|bound| {
			if !removed.contains(Some(&bound.node)) {
				return true;
			}
			if let Err(error) = bound.node.remove_event_listener_with_callback(&bound.listener.event, bound.closure.as_ref().unchecked_ref()) {
				warn!("Failed to remove event listener {:?}: {:?}", bound.listener.event, error)
			}
			false
		});
		trace!("Freed {} event listener(s).", before - self.listeners.len());
	}
}

fn to_js(value: &serde_json::Value) -> Result<JsValue, JsValue> {
	Ok(match value {
		serde_json::Value::Null => JsValue::NULL,
		serde_json::Value::Bool(value) => JsValue::from_bool(*value),
		serde_json::Value::Number(number) => number.as_f64().map_or(JsValue::NULL, JsValue::from_f64),
		serde_json::Value::String(string) => JsValue::from_str(string),
		serde_json::Value::Array(_) | serde_json::Value::Object(_) => JSON::parse(&value.to_string())?,
	})
}

impl Dom for WebDom {
	type Node = Node;

	fn kind(&self, node: &Node) -> NodeKind {
		match node.node_type() {
			Node::ELEMENT_NODE => NodeKind::Element,
			Node::TEXT_NODE => NodeKind::Text,
			Node::COMMENT_NODE => NodeKind::Comment,
			_ => NodeKind::Other,
		}
	}

	fn tag_name(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<Element>().map(Element::tag_name)
	}

	fn attributes(&self, node: &Node) -> Vec<Attribute> {
		let element = match node.dyn_ref::<Element>() {
			Some(element) => element,
			None => return Vec::new(),
		};
		let attributes = element.attributes();
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attribute| Attribute::new(attribute.name(), attribute.value()))
			.collect()
	}

	fn set_attribute(&mut self, node: &Node, name: &str, value: &str) {
		match node.dyn_ref::<Element>() {
			Some(element) => {
				if let Err(error) = element.set_attribute(name, value) {
					error!("Could not set attribute {:?}: {:?}", name, error)
				}
			}
			None => error!("Tried to set attribute {:?} on non-element {:?}", name, node),
		}
	}

	fn remove_attribute(&mut self, node: &Node, name: &str) {
		if let Some(element) = node.dyn_ref::<Element>() {
			if let Err(error) = element.remove_attribute(name) {
				warn!("Could not remove attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn data(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<CharacterData>().map(CharacterData::data)
	}

	fn set_data(&mut self, node: &Node, data: &str) {
		match node.dyn_ref::<CharacterData>() {
			Some(character_data) => character_data.set_data(data),
			None => error!("Tried to set character data on {:?}", node),
		}
	}

	fn child_nodes(&self, node: &Node) -> Vec<Node> {
		let child_nodes = node.child_nodes();
		(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).collect()
	}

	fn parent(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn create_element(&mut self, tag: &str) -> Option<Node> {
		match self.document.create_element(tag) {
			Ok(element) => Some(element.into()),
			Err(error) => {
				error!("Could not create <{}>: {:?}", tag, error);
				None
			}
		}
	}

	fn create_text(&mut self, data: &str) -> Node {
		self.document.create_text_node(data).into()
	}

	fn create_comment(&mut self, data: &str) -> Node {
		self.document.create_comment(data).into()
	}

	fn insert_before(&mut self, parent: &Node, child: &Node, reference: Option<&Node>) {
		if let Err(error) = parent.insert_before(child, reference) {
			error!("Could not insert {:?} into {:?}: {:?}", child, parent, error)
		}
	}

	fn remove_child(&mut self, parent: &Node, child: &Node) {
		match parent.remove_child(child) {
			Ok(removed) => self.release_listeners(&removed),
			Err(error) => error!("Could not remove {:?} from {:?}: {:?}", child, parent, error),
		}
	}

	fn replace_child(&mut self, parent: &Node, new_child: &Node, old_child: &Node) {
		match parent.replace_child(new_child, old_child) {
			Ok(replaced) => self.release_listeners(&replaced),
			Err(error) => error!("Could not replace {:?} in {:?}: {:?}", old_child, parent, error),
		}
	}

	fn set_property(&mut self, node: &Node, name: &str, value: &serde_json::Value) {
		let result = to_js(value).and_then(|value| Reflect::set(node, &JsValue::from_str(name), &value));
		match result {
			Ok(true) => (),
			Ok(false) => warn!("Property {:?} was not set", name),
			Err(error) => error!("Could not set property {:?}: {:?}", name, error),
		}
	}

	fn add_event_listener(&mut self, node: &Node, listener: &Listener) {
		let handler = listener.handler.clone();
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| handler(&DomEvent { name: event.type_() })) as Box<dyn Fn(web_sys::Event)>);
		if let Err(error) = node.add_event_listener_with_callback(&listener.event, closure.as_ref().unchecked_ref()) {
			return error!("Failed to add event listener {:?}: {:?}", listener.event, error);
		}
		self.listeners.push(BoundListener {
			node: node.clone(),
			listener: listener.clone(),
			closure,
		})
	}

	fn remove_event_listener(&mut self, node: &Node, listener: &Listener) {
		let index = match self.listeners.iter().position(|bound| bound.node == *node && bound.listener == *listener) {
			Some(index) => index,
			None => return error!("Tried to remove unknown event listener {:?}", listener.event),
		};
		let bound = self.listeners.remove(index);
		if let Err(error) = node.remove_event_listener_with_callback(&listener.event, bound.closure.as_ref().unchecked_ref()) {
			error!("Failed to remove event listener {:?}: {:?}", listener.event, error)
		}
	}
}
