#![doc(html_root_url = "https://docs.rs/hydrate-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Server-side rendering hydration for component trees, plus build-time stylesheet scoping.
//!
//! - [`ssr`] renders a component tree into any [`Dom`], embedding each component's render state.
//! - [`hydrate_element`] adopts that output on the client: It loads the server DOM, constructs
//!   components from their embedded state, reconciles the result with the client render and keeps
//!   [preserved](`PRESERVE_ATTRIBUTE`) subtrees untouched.
//! - [`scope`] rewrites component stylesheets so that they only match their component's elements.
//!
//! [`MemoryDom`] works anywhere. The `web` feature adds [`WebDom`](`web::WebDom`) for browsers.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod component;
pub mod config;
pub mod context;
mod diff;
pub mod dom;
pub mod error;
pub mod load;
pub mod memory;
pub mod scope;
pub mod ssr;
pub mod vdom;
#[cfg(feature = "web")]
pub mod web;

pub use component::{Capabilities, Component, ComponentDefinition, ComponentInstance, Definition};
pub use config::HydrationOptions;
pub use context::{HydrationReport, Mismatch, MismatchKind, PreserveOrigin, PreservedSubtree, PreservedSubtrees};
pub use diff::{hydrate, hydrate_element, mount_element, Mounted};
pub use dom::{Dom, DomEvent, NodeKind};
pub use error::{HydrationMountError, HydrationStateError, RenderError, ScopingError, ScopingErrorKind};
pub use memory::{MemoryDom, NodeId};
pub use vdom::{Attribute, NodePath, VElement, VNode};

/// Carries a component's Serialized Render State (JSON) on its host element in server output.
/// Removed once read during hydration.
pub const STATE_ATTRIBUTE: &str = "data-ssr-state";

/// Marks server content that survives all client renders untouched.
pub const PRESERVE_ATTRIBUTE: &str = "data-ssr-preserve";

#[cfg(feature = "dangerous-logging")]
fn redact(content: &str) -> &str {
	content
}

#[cfg(not(feature = "dangerous-logging"))]
fn redact(_content: &str) -> &'static str {
	"[redacted]"
}
