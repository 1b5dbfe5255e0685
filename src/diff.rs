//! The reconciler: Hydrates server-rendered DOM, then keeps it in sync with client renders.
//!
//! Both passes walk the previous bound tree and the new client tree side by side, depth-first,
//! parent before children and siblings in document order. The client always wins.
//! Preserved subtrees are never descended into.
//!
//! # Correct Use
//!
//! While a pass runs, the reconciler must be the only mutator of the mount point's subtree.
//! Custom elements must be registered with the host before mounting, since instances are
//! constructed synchronously during the walk.

use crate::{
	component::{render_template, scope_host, Component, ComponentDefinition, Definition, Template},
	config::HydrationOptions,
	context::{HydrationContext, HydrationReport, Mismatch, MismatchKind, PreserveOrigin, PreservedSubtrees},
	dom::{Dom, NodeKind},
	error::{HydrationMountError, HydrationStateError, RenderError},
	load::load_element,
	redact,
	vdom::{Attribute, ComponentSlot, Listener, NodePath, Property, VElement, VNode},
	PRESERVE_ATTRIBUTE, STATE_ATTRIBUTE,
};
use core::{fmt::Debug, iter::Peekable, mem};
use std::{rc::Rc, vec};
use tracing::{debug, error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
	/// The previous tree was loaded from server output. Disagreements are recorded.
	Hydrate,
	/// The previous tree is the last client render.
	Update,
}

struct Reconciler<'a, D: Dom> {
	dom: &'a mut D,
	pass: Pass,
	context: HydrationContext<D::Node>,
	options: &'a HydrationOptions,
	/// Set while walking below a static element: Nodes are bound, but attributes and text aren't compared.
	binding_static: bool,
}

impl<'a, D: Dom> Reconciler<'a, D> {
	fn new(dom: &'a mut D, pass: Pass, preserved: PreservedSubtrees<D::Node>, options: &'a HydrationOptions) -> Self {
		Self {
			dom,
			pass,
			context: HydrationContext {
				preserved,
				report: HydrationReport::default(),
			},
			options,
			binding_static: false,
		}
	}

	fn mismatch(&mut self, path: &NodePath, kind: MismatchKind, expected: String, found: String) {
		debug!("Mismatch at {}: {:?}, expected {} but found {}", path, kind, expected, found);
		self.context.report.mismatches.push(Mismatch { path: path.clone(), kind, expected, found })
	}

	/// `parent` is only needed if `old` has to be replaced.
	fn reconcile_node(&mut self, parent: Option<&D::Node>, old: VNode<D::Node>, new: VNode, path: &NodePath, depth: usize) -> VNode<D::Node> {
		#[cfg(feature = "log-paths")]
		let span = trace_span!("reconcile_node", %path, old = %old.describe(), new = %new.describe());
		#[cfg(not(feature = "log-paths"))]
		let span = trace_span!("reconcile_node", old = %old.describe(), new = %new.describe());
		let _enter = span.enter();

		if depth >= self.options.depth_limit {
			error!("Depth limit reached; Leaving {} as it is.", old.describe());
			return old;
		}

		let old = match old {
			VNode::Element(mut element) if element.preserve => {
				if self.pass == Pass::Hydrate && element.children.is_empty() {
					warn!("<{}> is marked to be preserved but has no content; Treating it as ordinary server output.", element.tag);
					self.mismatch(path, MismatchKind::EmptyPreserve, "preserved content".to_owned(), "nothing".to_owned());
					element.preserve = false;
					VNode::Element(element)
				} else {
					return VNode::Element(self.keep_preserved(element, path, PreserveOrigin::Marker));
				}
			}
			old => old,
		};

		match (old, new) {
			(VNode::Element(old), VNode::Element(new)) if old.tag == new.tag => VNode::Element(self.reconcile_element(old, new, path, depth)),

			(VNode::Text { data: old_data, binding }, VNode::Text { .. }) if self.binding_static => {
				self.context.report.reused += 1;
				VNode::Text { data: old_data, binding }
			}

			(VNode::Comment { data: old_data, binding }, VNode::Comment { .. }) if self.binding_static => {
				self.context.report.reused += 1;
				VNode::Comment { data: old_data, binding }
			}

			(VNode::Text { data: old_data, binding }, VNode::Text { data, .. }) => {
				if old_data != data {
					if self.pass == Pass::Hydrate {
						self.mismatch(path, MismatchKind::Text, redact(&data).to_owned(), redact(&old_data).to_owned());
					}
					self.dom.set_data(&binding, &data)
				}
				self.context.report.reused += 1;
				VNode::Text { data, binding }
			}

			(VNode::Comment { data: old_data, binding }, VNode::Comment { data, .. }) => {
				if old_data != data {
					if self.pass == Pass::Hydrate {
						self.mismatch(path, MismatchKind::Comment, redact(&data).to_owned(), redact(&old_data).to_owned());
					}
					self.dom.set_data(&binding, &data)
				}
				self.context.report.reused += 1;
				VNode::Comment { data, binding }
			}

			(old, new) => match parent {
				Some(parent) => self.replace(parent, old, new, path, depth),
				None => {
					error!("Can't replace parentless {} with {}; Keeping it.", old.describe(), new.describe());
					old
				}
			},
		}
	}

	/// Registers `element` as preserved and detaches its descendants from the walk.
	fn keep_preserved(&mut self, mut element: VElement<D::Node>, path: &NodePath, origin: PreserveOrigin) -> VElement<D::Node> {
		trace!("Preserving <{}> as it is", element.tag);
		if self.context.preserved.register(path.clone(), element.binding.clone(), origin) {
			self.context.report.preserved += 1;
		}
		let component = element.component.take();
		let mut shell = element.shell();
		shell.preserve = true;
		shell.component = component;
		shell
	}

	#[allow(clippy::too_many_lines)]
	fn reconcile_element(&mut self, mut old: VElement<D::Node>, mut new: VElement, path: &NodePath, depth: usize) -> VElement<D::Node> {
		debug_assert_eq!(old.tag, new.tag);
		let node = old.binding.clone();
		self.context.report.reused += 1;

		let mut fresh_children = false;
		let mut component = None;
		if let Some(ComponentSlot { definition, .. }) = new.component.take() {
			if !definition.capabilities().renders_on_client {
				trace!("<{}> doesn't render on the client", definition.tag());
				old.component = Some(ComponentSlot::new(definition));
				return self.keep_preserved(old, path, PreserveOrigin::ServerOnlyComponent);
			}

			let instance = match self.pass {
				Pass::Hydrate => {
					let state = old.remove_attribute(STATE_ATTRIBUTE);
					if state.is_some() {
						self.dom.remove_attribute(&node, STATE_ATTRIBUTE)
					}
					if !definition.capabilities().renders_on_server {
						trace!("<{}> was rendered as placeholder; Rendering its content from scratch.", definition.tag());
						fresh_children = true;
					}
					match definition.instantiate(&new.attributes, state.as_deref()) {
						Ok(instance) => instance,
						Err(source) => {
							error!("Incompatible render state for <{}>: {}", definition.tag(), source);
							self.mismatch(path, MismatchKind::State, "render state".to_owned(), "incompatible render state".to_owned());
							self.context.report.state_errors.push(HydrationStateError {
								tag: definition.tag().to_owned(),
								path: path.clone(),
								source,
							});
							fresh_children = true;
							definition.create(&new.attributes)
						}
					}
				}
				Pass::Update => match old.component.take() {
					Some(ComponentSlot {
						definition: old_definition,
						instance: Some(instance),
					}) if old_definition.tag() == definition.tag() => instance,
					_ => definition.create(&new.attributes),
				},
			};

			scope_host(&mut new, &*definition);
			new.children = render_template(&*definition, &*instance, Template::Render);
			component = Some(ComponentSlot {
				definition,
				instance: Some(instance),
			});
		}

		let VElement {
			tag,
			mut attributes,
			children,
			properties,
			listeners,
			preserve,
			is_static,
			..
		} = new;
		if preserve {
			set_attribute(&mut attributes, PRESERVE_ATTRIBUTE, "")
		}

		let binds_static = !fresh_children
			&& (self.binding_static
				|| is_static
					&& match self.pass {
						Pass::Hydrate => old.children.len() == children.len() && old.children.iter().zip(&children).all(|(a, b)| a.same_shape(b)),
						Pass::Update => old.is_static,
					});
		let children = if binds_static {
			// Listeners, properties and components below still have to be bound.
			trace!("Binding static content without comparison");
			attributes = old.attributes.clone();
			let outer = mem::replace(&mut self.binding_static, true);
			let children = self.reconcile_children(&node, old.children, children, path, depth);
			self.binding_static = outer;
			children
		} else {
			self.patch_attributes(&node, &old.attributes, &attributes, path);
			if fresh_children {
				self.replace_children(&node, old.children, children, path, depth)
			} else {
				self.reconcile_children(&node, old.children, children, path, depth)
			}
		};
		self.patch_properties(&node, &old.properties, &properties);
		self.patch_listeners(&node, &old.listeners, &listeners);

		if preserve && self.context.preserved.register(path.clone(), node.clone(), PreserveOrigin::Client) {
			self.context.report.preserved += 1;
		}

		VElement {
			tag,
			attributes,
			children,
			component,
			properties,
			listeners,
			preserve,
			is_static,
			binding: node,
		}
	}

	#[instrument(skip(self, old, new))]
	fn patch_attributes(&mut self, node: &D::Node, old: &[Attribute], new: &[Attribute], path: &NodePath) {
		let (mut a_1, mut a_2) = (old, new);
		while !a_1.is_empty() && a_1.first() == a_2.first() {
			a_1 = &a_1[1..];
			a_2 = &a_2[1..];
		}
		while !a_1.is_empty() && a_1.last() == a_2.last() {
			a_1 = &a_1[..a_1.len() - 1];
			a_2 = &a_2[..a_2.len() - 1];
		}
		if a_1.is_empty() && a_2.is_empty() {
			return;
		}

		if self.pass == Pass::Hydrate {
			let relevant = |attributes: &[Attribute]| {
				let mut relevant: Vec<_> = attributes.iter().filter(|a| a.name != STATE_ATTRIBUTE && a.name != PRESERVE_ATTRIBUTE).cloned().collect();
				relevant.sort_by(|a, b| a.name.cmp(&b.name));
				relevant
			};
			let (server, client) = (relevant(old), relevant(new));
			if server != client {
				self.mismatch(path, MismatchKind::Attributes, describe_attributes(&client), describe_attributes(&server));
			}
		}

		for removed in a_1 {
			if !a_2.iter().any(|a| a.name == removed.name) {
				self.dom.remove_attribute(node, &removed.name)
			}
		}
		for added in a_2 {
			if !a_1.contains(added) {
				self.dom.set_attribute(node, &added.name, &added.value)
			}
		}
	}

	/// Properties can't be unset, so ones that disappear keep their last value.
	fn patch_properties(&mut self, node: &D::Node, old: &[Property], new: &[Property]) {
		for property in new {
			if !old.contains(property) {
				self.dom.set_property(node, &property.name, &property.value)
			}
		}
	}

	fn patch_listeners(&mut self, node: &D::Node, old: &[Listener], new: &[Listener]) {
		if STATIC_MAX_LEVEL >= Level::ERROR {
			for (i_a, l_a) in new.iter().enumerate() {
				for (i_b, l_b) in new.iter().enumerate() {
					if i_a != i_b && l_a == l_b {
						// Identical listeners are deduplicated by browsers, so they can't be tracked separately.
						error!("Duplicate event listener for {:?}", l_a.event)
					}
				}
			}
		}

		let (mut l_1, mut l_2) = (old, new);
		while !l_1.is_empty() && l_1.first() == l_2.first() {
			l_1 = &l_1[1..];
			l_2 = &l_2[1..];
		}
		while !l_1.is_empty() && l_1.last() == l_2.last() {
			l_1 = &l_1[..l_1.len() - 1];
			l_2 = &l_2[..l_2.len() - 1];
		}

		for prior in l_1 {
			if !l_2.contains(prior) {
				self.dom.remove_event_listener(node, prior)
			}
		}
		for added in l_2 {
			if !l_1.contains(added) {
				self.dom.add_event_listener(node, added)
			}
		}
	}

	fn reconcile_children(&mut self, parent: &D::Node, old: Vec<VNode<D::Node>>, new: Vec<VNode>, path: &NodePath, depth: usize) -> Vec<VNode<D::Node>> {
		let mut old = old.into_iter().peekable();
		let mut children = Vec::with_capacity(new.len());
		for new_child in new {
			if !matches!(new_child, VNode::Text { .. }) {
				self.skip_server_whitespace(parent, &mut old);
			}
			let child_path = path.child(children.len());
			match old.next() {
				Some(old_child) => children.push(self.reconcile_node(Some(parent), old_child, new_child, &child_path, depth + 1)),
				None => {
					if self.pass == Pass::Hydrate {
						self.mismatch(&child_path, MismatchKind::Structure, new_child.describe(), "nothing".to_owned());
					}
					if let Some(created) = self.create(new_child, &child_path, depth + 1) {
						self.dom.insert_before(parent, created.binding(), None);
						children.push(created)
					}
				}
			}
		}

		for leftover in old {
			let child_path = path.child(children.len());
			match leftover {
				leftover if self.is_ignored_whitespace(&leftover) => {
					trace!("Removing surplus whitespace-only server text");
					self.remove(parent, &leftover)
				}
				VNode::Element(element) if element.preserve => {
					trace!("Keeping surplus preserved <{}>", element.tag);
					children.push(VNode::Element(self.keep_preserved(element, &child_path, PreserveOrigin::Marker)))
				}
				leftover => {
					if self.pass == Pass::Hydrate {
						self.mismatch(&child_path, MismatchKind::Structure, "nothing".to_owned(), leftover.describe());
					}
					self.remove(parent, &leftover)
				}
			}
		}

		children
	}

	/// Whitespace-only server text is formatting the client templates don't reproduce.
	fn is_ignored_whitespace(&self, node: &VNode<D::Node>) -> bool {
		self.pass == Pass::Hydrate
			&& self.options.ignore_whitespace_text
			&& matches!(node, VNode::Text { data, .. } if data.chars().all(char::is_whitespace))
	}

	/// Removes ignored whitespace text ahead of a client node that isn't text, so it can't take that node's place.
	fn skip_server_whitespace(&mut self, parent: &D::Node, old: &mut Peekable<vec::IntoIter<VNode<D::Node>>>) {
		while old.peek().map_or(false, |next| self.is_ignored_whitespace(next)) {
			if let Some(whitespace) = old.next() {
				trace!("Removing whitespace-only server text");
				self.remove(parent, &whitespace)
			}
		}
	}

	/// Discards all of `old` and renders `new` from scratch.
	fn replace_children(&mut self, parent: &D::Node, old: Vec<VNode<D::Node>>, new: Vec<VNode>, path: &NodePath, depth: usize) -> Vec<VNode<D::Node>> {
		for old_child in &old {
			self.remove(parent, old_child)
		}
		let mut children = Vec::with_capacity(new.len());
		for new_child in new {
			let child_path = path.child(children.len());
			if let Some(created) = self.create(new_child, &child_path, depth + 1) {
				self.dom.insert_before(parent, created.binding(), None);
				children.push(created)
			}
		}
		children
	}

	fn replace(&mut self, parent: &D::Node, old: VNode<D::Node>, new: VNode, path: &NodePath, depth: usize) -> VNode<D::Node> {
		if self.pass == Pass::Hydrate {
			self.mismatch(path, MismatchKind::Structure, new.describe(), old.describe());
		}
		let description = new.describe();
		match self.create(new, path, depth) {
			Some(created) => {
				self.dom.replace_child(parent, created.binding(), old.binding());
				self.context.report.removed += 1;
				created
			}
			None => {
				error!("Could not create {}; Keeping {}.", description, old.describe());
				old
			}
		}
	}

	fn remove(&mut self, parent: &D::Node, old: &VNode<D::Node>) {
		self.dom.remove_child(parent, old.binding());
		self.context.report.removed += 1;
	}

	/// Builds detached DOM for `new`. The caller inserts it.
	fn create(&mut self, new: VNode, path: &NodePath, depth: usize) -> Option<VNode<D::Node>> {
		match new {
			VNode::Element(element) => self.create_element(element, path, depth).map(VNode::Element),
			VNode::Text { data, .. } => {
				self.context.report.created += 1;
				let binding = self.dom.create_text(&data);
				Some(VNode::Text { data, binding })
			}
			VNode::Comment { data, .. } => {
				self.context.report.created += 1;
				let binding = self.dom.create_comment(&data);
				Some(VNode::Comment { data, binding })
			}
		}
	}

	fn create_element(&mut self, mut new: VElement, path: &NodePath, depth: usize) -> Option<VElement<D::Node>> {
		if depth >= self.options.depth_limit {
			error!("Depth limit reached; Not creating <{}>.", new.tag);
			return None;
		}

		if let Some(preserved) = self.context.preserved.get(path) {
			if self.dom.tag_name(&preserved.node).map_or(false, |tag| tag.eq_ignore_ascii_case(&new.tag)) {
				trace!("Splicing in preserved <{}>", new.tag);
				let binding = preserved.node.clone();
				let component = new.component.take().map(|slot| ComponentSlot::new(slot.definition));
				return Some(VElement {
					tag: new.tag,
					attributes: new.attributes,
					children: Vec::new(),
					component,
					properties: Vec::new(),
					listeners: Vec::new(),
					preserve: true,
					is_static: new.is_static,
					binding,
				});
			}
		}

		let node = match self.dom.create_element(&new.tag) {
			Some(node) => node,
			None => {
				error!("Could not create <{}>", new.tag);
				return None;
			}
		};
		self.context.report.created += 1;

		let mut component = None;
		if let Some(ComponentSlot { definition, .. }) = new.component.take() {
			if definition.capabilities().renders_on_client {
				let instance = definition.create(&new.attributes);
				scope_host(&mut new, &*definition);
				new.children = render_template(&*definition, &*instance, Template::Render);
				component = Some(ComponentSlot {
					definition,
					instance: Some(instance),
				});
			} else {
				warn!("<{}> doesn't render on the client; Leaving it empty.", definition.tag());
				component = Some(ComponentSlot::new(definition));
			}
		}

		if new.preserve {
			set_attribute(&mut new.attributes, PRESERVE_ATTRIBUTE, "");
			if self.context.preserved.register(path.clone(), node.clone(), PreserveOrigin::Client) {
				self.context.report.preserved += 1;
			}
		}
		for Attribute { name, value } in &new.attributes {
			self.dom.set_attribute(&node, name, value)
		}
		for Property { name, value } in &new.properties {
			self.dom.set_property(&node, name, value)
		}
		for listener in &new.listeners {
			self.dom.add_event_listener(&node, listener)
		}

		let mut children = Vec::with_capacity(new.children.len());
		for child in new.children {
			let child_path = path.child(children.len());
			if let Some(created) = self.create(child, &child_path, depth + 1) {
				self.dom.insert_before(&node, created.binding(), None);
				children.push(created)
			}
		}

		Some(VElement {
			tag: new.tag,
			attributes: new.attributes,
			children,
			component,
			properties: new.properties,
			listeners: new.listeners,
			preserve: new.preserve,
			is_static: new.is_static,
			binding: node,
		})
	}
}

fn set_attribute(attributes: &mut Vec<Attribute>, name: &str, value: &str) {
	match attributes.iter_mut().find(|a| a.name == name) {
		Some(existing) => existing.value = value.to_owned(),
		None => attributes.push(Attribute::new(name, value)),
	}
}

fn describe_attributes(attributes: &[Attribute]) -> String {
	let described: Vec<_> = attributes.iter().map(|a| format!("{}={:?}", a.name, redact(&a.value))).collect();
	format!("[{}]", described.join(", "))
}

/// Hydrates the server-rendered component host `root` with `definition`.
///
/// The host's server attributes (except the embedded render state) become the client's host attributes.
///
/// # Errors
///
/// Iff `root` is missing or not an element, or if its tag doesn't match `definition` and it can't be replaced.
/// Any other disagreement between server and client is resolved in favour of the client and recorded in [`Mounted::report`].
#[instrument(skip(dom, definition))]
pub fn hydrate_element<D: Dom>(
	dom: &mut D,
	definition: Rc<dyn ComponentDefinition>,
	root: Option<&D::Node>,
	options: &HydrationOptions,
) -> Result<Mounted<D::Node>, HydrationMountError> {
	let root = root.ok_or(HydrationMountError::MissingRoot)?;
	match dom.kind(root) {
		NodeKind::Element => (),
		kind => {
			return Err(HydrationMountError::NotAnElement {
				found: format!("{:?}", kind).to_ascii_lowercase(),
			})
		}
	}

	let server = load_element(dom, root, options).ok_or_else(|| HydrationMountError::NotAnElement { found: format!("{:?}", root) })?;
	let host_attributes: Vec<_> = server
		.attributes
		.iter()
		.filter(|a| a.name != STATE_ATTRIBUTE && a.name != PRESERVE_ATTRIBUTE)
		.cloned()
		.collect();

	let mut host = VNode::host(definition.clone());
	host.attributes = host_attributes.clone();

	let parent = if server.tag == host.tag {
		None
	} else {
		match dom.parent(root) {
			Some(parent) => Some(parent),
			None => {
				return Err(HydrationMountError::DetachedRootMismatch {
					expected: host.tag,
					found: server.tag,
				})
			}
		}
	};

	let mut reconciler = Reconciler::new(dom, Pass::Hydrate, PreservedSubtrees::default(), options);
	let tree = reconciler.reconcile_node(parent.as_ref(), VNode::Element(server), VNode::Element(host), &NodePath::root(), 0);
	let HydrationContext { preserved, report } = reconciler.context;
	if tree.binding() == root && parent.is_some() {
		return Err(HydrationMountError::RootRecreationFailed { tag: definition.tag().to_owned() });
	}

	info!(
		"Hydrated <{}>: {} mismatch(es), {} state error(s), {} created, {} removed, {} reused, {} preserved",
		definition.tag(),
		report.mismatches.len(),
		report.state_errors.len(),
		report.created,
		report.removed,
		report.reused,
		report.preserved,
	);
	Ok(Mounted {
		definition,
		host_attributes,
		tree,
		preserved,
		report,
		options: options.clone(),
	})
}

/// [`hydrate_element`] with a plain [`Definition`] and default options.
///
/// # Errors
///
/// See [`hydrate_element`].
pub fn hydrate<C: Component, D: Dom>(dom: &mut D, root: Option<&D::Node>) -> Result<Mounted<D::Node>, HydrationMountError> {
	hydrate_element(dom, Definition::<C>::new().shared(), root, &HydrationOptions::default())
}

/// Renders a component into `parent` on the client alone, without any server output to adopt.
///
/// # Errors
///
/// Iff the host element can't be created.
#[instrument(skip(dom, definition))]
pub fn mount_element<D: Dom>(
	dom: &mut D,
	parent: &D::Node,
	definition: Rc<dyn ComponentDefinition>,
	attributes: &[Attribute],
	options: &HydrationOptions,
) -> Result<Mounted<D::Node>, RenderError> {
	let mut host = VNode::host(definition.clone());
	host.attributes = attributes.to_vec();

	let mut reconciler = Reconciler::new(dom, Pass::Update, PreservedSubtrees::default(), options);
	let tree = reconciler
		.create_element(host, &NodePath::root(), 0)
		.ok_or_else(|| RenderError::CreateElement { tag: definition.tag().to_owned() })?;
	reconciler.dom.insert_before(parent, &tree.binding, None);
	let HydrationContext { preserved, report } = reconciler.context;

	Ok(Mounted {
		definition,
		host_attributes: attributes.to_vec(),
		tree: VNode::Element(tree),
		preserved,
		report,
		options: options.clone(),
	})
}

/// A live component tree, bound to the DOM it was mounted on.
///
/// Owns every component instance in the tree and the preserved-subtree registry.
#[derive(Debug)]
pub struct Mounted<N> {
	definition: Rc<dyn ComponentDefinition>,
	host_attributes: Vec<Attribute>,
	tree: VNode<N>,
	preserved: PreservedSubtrees<N>,
	report: HydrationReport,
	options: HydrationOptions,
}

impl<N: Clone + PartialEq + Debug> Mounted<N> {
	/// The bound tree. Its root is the host element unless hydration had to keep a mismatched root.
	#[must_use]
	pub fn root(&self) -> &VNode<N> {
		&self.tree
	}

	#[must_use]
	pub fn node(&self) -> &N {
		self.tree.binding()
	}

	/// What the mounting pass did.
	#[must_use]
	pub fn report(&self) -> &HydrationReport {
		&self.report
	}

	#[must_use]
	pub fn preserved(&self) -> &PreservedSubtrees<N> {
		&self.preserved
	}

	/// The root component.
	#[must_use]
	pub fn instance<C: Component>(&self) -> Option<&C> {
		self.tree.as_element()?.instance()?.downcast_ref()
	}

	pub fn instance_mut<C: Component>(&mut self) -> Option<&mut C> {
		match &mut self.tree {
			VNode::Element(element) => element.component.as_mut()?.instance_mut()?.downcast_mut(),
			VNode::Text { .. } | VNode::Comment { .. } => None,
		}
	}

	/// The first instance of `C` in document order.
	#[must_use]
	pub fn find_instance<C: Component>(&self) -> Option<&C> {
		find_instance(&self.tree)
	}

	/// Re-renders every component and applies the differences to `dom`.
	///
	/// Component instances are kept where their host survives. Preserved subtrees are left alone,
	/// and moved into place unchanged if an ancestor had to be recreated.
	#[instrument(skip(self, dom))]
	pub fn rerender<D: Dom<Node = N>>(&mut self, dom: &mut D) -> HydrationReport {
		let mut host = VNode::host(self.definition.clone());
		host.attributes = self.host_attributes.clone();

		let placeholder = self.tree.shell();
		let old = mem::replace(&mut self.tree, placeholder);
		let parent = dom.parent(old.binding());
		let mut reconciler = Reconciler::new(dom, Pass::Update, mem::take(&mut self.preserved), &self.options);
		self.tree = reconciler.reconcile_node(parent.as_ref(), old, VNode::Element(host), &NodePath::root(), 0);
		let HydrationContext { preserved, report } = reconciler.context;
		self.preserved = preserved;

		debug!(
			"Re-rendered <{}>: {} created, {} removed, {} reused",
			self.definition.tag(),
			report.created,
			report.removed,
			report.reused,
		);
		report
	}
}

fn find_instance<C: Component, N>(node: &VNode<N>) -> Option<&C> {
	let element = node.as_element()?;
	element
		.instance()
		.and_then(|instance| instance.downcast_ref::<C>())
		.or_else(|| element.children.iter().find_map(find_instance::<C, N>))
}
