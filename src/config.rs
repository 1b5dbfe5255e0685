use serde::{Deserialize, Serialize};

/// Tuning knobs for [`hydrate_element`](`crate::hydrate_element`) and [`Mounted::rerender`](`crate::Mounted::rerender`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HydrationOptions {
	/// Branches deeper than this are logged and left as they are.
	pub depth_limit: usize,
	/// Remove whitespace-only server text wherever the client template has no text node, without recording a mismatch.
	pub ignore_whitespace_text: bool,
}

impl Default for HydrationOptions {
	fn default() -> Self {
		Self {
			depth_limit: 512,
			ignore_whitespace_text: true,
		}
	}
}
