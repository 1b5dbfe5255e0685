use crate::vdom::NodePath;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Fatal conditions of [`hydrate_element`](`crate::hydrate_element`). Nothing is mounted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HydrationMountError {
	#[error("no root node to hydrate")]
	MissingRoot,

	#[error("hydration root must be an element, but found {found}")]
	NotAnElement { found: String },

	#[error("server root <{found}> does not match <{expected}>, and it has no parent to be replaced in")]
	DetachedRootMismatch { expected: String, found: String },

	#[error("could not create a replacement <{tag}> root")]
	RootRecreationFailed { tag: String },
}

/// A component's Serialized Render State could not be decoded into its state shape.
///
/// This is recorded in the [`HydrationReport`](`crate::HydrationReport`) rather than returned:
/// The component is created without state and its content is rendered from scratch.
#[derive(Error, Debug)]
#[error("incompatible render state for <{tag}> at {path}")]
pub struct HydrationStateError {
	pub tag: String,
	pub path: NodePath,
	#[source]
	pub source: serde_json::Error,
}

#[derive(Error, Debug)]
pub enum RenderError {
	#[error("could not serialize render state of <{tag}>")]
	State {
		tag: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("could not create <{tag}>")]
	CreateElement { tag: String },
}

/// A stylesheet could not be scoped. No output is produced for the file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {kind} (in `{selector}`)", .file.display())]
pub struct ScopingError {
	pub file: PathBuf,
	/// The offending selector or at-rule prelude. Empty for file-level failures.
	pub selector: String,
	pub kind: ScopingErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopingErrorKind {
	/// `:host`, `:host-context` or `:root`, which only make sense without a scoping context.
	RootContextSelector(String),
	Import,
	Syntax(String),
	Io(String),
}

impl fmt::Display for ScopingErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ScopingErrorKind::RootContextSelector(pseudo) => write!(f, "`{}` is not allowed in a scoped stylesheet", pseudo),
			ScopingErrorKind::Import => f.write_str("`@import` is not allowed in a scoped stylesheet"),
			ScopingErrorKind::Syntax(message) => write!(f, "syntax error: {}", message),
			ScopingErrorKind::Io(message) => write!(f, "could not read stylesheet: {}", message),
		}
	}
}
