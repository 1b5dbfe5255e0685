//! The component-definition boundary.
//!
//! Components are black boxes to this crate: given attributes and (optionally) recovered
//! render state they construct an instance, and the instance renders a template of child
//! [`VNode`]s for its host element.

use crate::{
	scope::{ScopedStylesheet, ScopingToken},
	vdom::{Attribute, VElement, VNode},
};
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
	marker::PhantomData,
};
use serde::{de::DeserializeOwned, Serialize};
use std::rc::Rc;

pub trait Component: Debug + Sized + 'static {
	/// The custom element name of this component's host.
	const TAG: &'static str;

	/// Build-time capability: Whether the server renders this component's content.
	/// If not, the server emits [`Component::placeholder`] and no render state.
	const RENDERS_ON_SERVER: bool = true;

	/// Build-time capability: Whether the client instantiates this component.
	/// If not, its server content is kept as delivered.
	const RENDERS_ON_CLIENT: bool = true;

	/// Serialized Render State, embedded on the host element by the server.
	type State: Serialize + DeserializeOwned;

	/// `state` is [`Some`] exactly when it was recovered from server output.
	fn create(attributes: &[Attribute], state: Option<Self::State>) -> Self;

	fn state(&self) -> &Self::State;

	fn render(&self) -> Vec<VNode>;

	fn placeholder(&self) -> Vec<VNode> {
		Vec::new()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
	pub renders_on_server: bool,
	pub renders_on_client: bool,
}

impl Capabilities {
	pub const UNIVERSAL: Self = Self {
		renders_on_server: true,
		renders_on_client: true,
	};
}

/// Object-safe view of a component definition, as stored in [`ComponentSlot`](`crate::vdom::ComponentSlot`)s.
pub trait ComponentDefinition: Debug {
	fn tag(&self) -> &str;

	fn capabilities(&self) -> Capabilities;

	fn stylesheet(&self) -> Option<&ScopedStylesheet>;

	fn scoping_token(&self) -> Option<&ScopingToken> {
		self.stylesheet().map(ScopedStylesheet::token)
	}

	/// Constructs an instance, decoding `state` as Serialized Render State if present.
	///
	/// # Errors
	///
	/// Iff `state` is present but doesn't match the component's state shape.
	fn instantiate(&self, attributes: &[Attribute], state: Option<&str>) -> Result<Box<dyn ComponentInstance>, serde_json::Error>;

	/// Constructs an instance without render state.
	fn create(&self, attributes: &[Attribute]) -> Box<dyn ComponentInstance>;
}

pub trait ComponentInstance: Debug {
	fn render(&self) -> Vec<VNode>;

	fn placeholder(&self) -> Vec<VNode>;

	/// # Errors
	///
	/// Iff the state can't be represented as JSON.
	fn serialize_state(&self) -> Result<String, serde_json::Error>;

	fn as_any(&self) -> &dyn Any;

	fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<'a> dyn ComponentInstance + 'a {
	#[must_use]
	pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
		self.as_any().downcast_ref()
	}

	pub fn downcast_mut<C: Component>(&mut self) -> Option<&mut C> {
		self.as_any_mut().downcast_mut()
	}
}

#[derive(Debug)]
struct Instance<C>(C);

impl<C: Component> ComponentInstance for Instance<C> {
	fn render(&self) -> Vec<VNode> {
		self.0.render()
	}

	fn placeholder(&self) -> Vec<VNode> {
		self.0.placeholder()
	}

	fn serialize_state(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self.0.state())
	}

	fn as_any(&self) -> &dyn Any {
		&self.0
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		&mut self.0
	}
}

/// The [`ComponentDefinition`] of a [`Component`] type, optionally with a scoped stylesheet registered against it.
pub struct Definition<C> {
	stylesheet: Option<ScopedStylesheet>,
	_component: PhantomData<fn() -> C>,
}

impl<C: Component> Definition<C> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			stylesheet: None,
			_component: PhantomData,
		}
	}

	#[must_use]
	pub fn with_stylesheet(mut self, stylesheet: ScopedStylesheet) -> Self {
		self.stylesheet = Some(stylesheet);
		self
	}

	#[must_use]
	pub fn shared(self) -> Rc<dyn ComponentDefinition> {
		Rc::new(self)
	}
}

impl<C: Component> Default for Definition<C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<C: Component> Debug for Definition<C> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Definition")
			.field("tag", &C::TAG)
			.field("stylesheet", &self.stylesheet.as_ref().map(ScopedStylesheet::token))
			.finish()
	}
}

impl<C: Component> ComponentDefinition for Definition<C> {
	fn tag(&self) -> &str {
		C::TAG
	}

	fn capabilities(&self) -> Capabilities {
		Capabilities {
			renders_on_server: C::RENDERS_ON_SERVER,
			renders_on_client: C::RENDERS_ON_CLIENT,
		}
	}

	fn stylesheet(&self) -> Option<&ScopedStylesheet> {
		self.stylesheet.as_ref()
	}

	fn instantiate(&self, attributes: &[Attribute], state: Option<&str>) -> Result<Box<dyn ComponentInstance>, serde_json::Error> {
		let state = state.map(serde_json::from_str::<C::State>).transpose()?;
		Ok(Box::new(Instance(C::create(attributes, state))))
	}

	fn create(&self, attributes: &[Attribute]) -> Box<dyn ComponentInstance> {
		Box::new(Instance(C::create(attributes, None)))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Template {
	Render,
	Placeholder,
}

/// Renders `instance`'s template and scopes every element in it with the definition's token.
pub(crate) fn render_template(definition: &dyn ComponentDefinition, instance: &dyn ComponentInstance, template: Template) -> Vec<VNode> {
	let mut nodes = match template {
		Template::Render => instance.render(),
		Template::Placeholder => instance.placeholder(),
	};
	if let Some(token) = definition.scoping_token() {
		for node in &mut nodes {
			scope_node(node, token)
		}
	}
	nodes
}

fn scope_node(node: &mut VNode, token: &ScopingToken) {
	if let VNode::Element(element) = node {
		element.add_class(token.as_str());
		for child in &mut element.children {
			scope_node(child, token)
		}
	}
}

/// A component's own token also goes on its host element, next to any tokens of the template that contains it.
pub(crate) fn scope_host(host: &mut VElement, definition: &dyn ComponentDefinition) {
	if let Some(token) = definition.scoping_token() {
		host.add_class(token.as_str())
	}
}
