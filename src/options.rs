/// Tuning for a [`Renderer`](`crate::Renderer`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	/// How many element levels a single render pass may descend before giving up with
	/// [`Error::DepthLimitReached`](`crate::Error::DepthLimitReached`).
	///
	/// The root VNode counts as level 1.
	pub depth_limit: usize,
}

impl Options {
	pub const DEFAULT_DEPTH_LIMIT: usize = 512;

	#[must_use]
	pub fn new() -> Self {
		Self {
			depth_limit: Self::DEFAULT_DEPTH_LIMIT,
		}
	}

	#[must_use]
	pub fn with_depth_limit(self, depth_limit: usize) -> Self {
		Self { depth_limit, ..self }
	}
}

impl Default for Options {
	fn default() -> Self {
		Self::new()
	}
}
