//! Per-call hydration bookkeeping.

use crate::{error::HydrationStateError, vdom::NodePath};
use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchKind {
	/// Different node kind or tag. The server node was replaced.
	Structure,
	Text,
	Comment,
	/// Attribute sets differed. The client's won.
	Attributes,
	/// A preserve marker without server content.
	EmptyPreserve,
	/// The render state didn't decode, so the component's content was rendered from scratch.
	State,
}

/// A single server/client disagreement and how it was found.
///
/// `expected` and `found` are structural descriptions, or page content with the `dangerous-logging` feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
	pub path: NodePath,
	pub kind: MismatchKind,
	pub expected: String,
	pub found: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreserveOrigin {
	/// `data-ssr-preserve` in the server output.
	Marker,
	/// A component that doesn't render on the client.
	ServerOnlyComponent,
	/// Marked [`preserved`](`crate::VElement::preserved`) by the client template only.
	Client,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreservedSubtree<N> {
	pub node: N,
	pub origin: PreserveOrigin,
}

/// Preserved subtree roots by position. There is exactly one entry per preserved element.
#[derive(Debug, Clone)]
pub struct PreservedSubtrees<N> {
	entries: HashMap<NodePath, PreservedSubtree<N>>,
}

impl<N> Default for PreservedSubtrees<N> {
	fn default() -> Self {
		Self { entries: HashMap::new() }
	}
}

impl<N> PreservedSubtrees<N> {
	/// Returns `false` if `path` was already registered, in which case the existing entry is kept.
	pub(crate) fn register(&mut self, path: NodePath, node: N, origin: PreserveOrigin) -> bool {
		match self.entries.entry(path) {
			hashbrown::hash_map::Entry::Occupied(_) => false,
			hashbrown::hash_map::Entry::Vacant(vacant) => {
				vacant.insert(PreservedSubtree { node, origin });
				true
			}
		}
	}

	#[must_use]
	pub fn get(&self, path: &NodePath) -> Option<&PreservedSubtree<N>> {
		self.entries.get(path)
	}

	#[must_use]
	pub fn contains(&self, path: &NodePath) -> bool {
		self.entries.contains_key(path)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// In no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (&NodePath, &PreservedSubtree<N>)> {
		self.entries.iter()
	}
}

/// What a hydration or re-render pass did.
#[derive(Debug, Default)]
pub struct HydrationReport {
	pub mismatches: Vec<Mismatch>,
	pub state_errors: Vec<HydrationStateError>,
	/// DOM nodes created, counting each node of a new subtree.
	pub created: usize,
	/// Subtrees detached from the DOM.
	pub removed: usize,
	/// Server nodes adopted as-is or patched in place.
	pub reused: usize,
	pub preserved: usize,
}

impl HydrationReport {
	/// Whether server and client agreed everywhere.
	#[must_use]
	pub fn is_clean(&self) -> bool {
		self.mismatches.is_empty() && self.state_errors.is_empty()
	}
}

#[derive(Debug)]
pub struct HydrationContext<N> {
	pub preserved: PreservedSubtrees<N>,
	pub report: HydrationReport,
}

impl<N> Default for HydrationContext<N> {
	fn default() -> Self {
		Self {
			preserved: PreservedSubtrees::default(),
			report: HydrationReport::default(),
		}
	}
}

impl<N> HydrationContext<N> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}
