use thiserror::Error;

/// Faults reported by the reconciler and the loader.
///
/// Host failures the differ cannot act on (for example a rejected `appendChild` in a browser)
/// are logged instead and don't show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// A positional access went past the live parent's current child count.
	///
	/// This usually means the live tree was changed out-of-band since the last render.
	#[error("child index {index} is out of range for a parent with {len} child node(s)")]
	IndexOutOfRange { index: usize, len: usize },

	/// The tree is nested deeper than [`Options::depth_limit`](`crate::Options::depth_limit`) allows.
	#[error("depth limit reached")]
	DepthLimitReached,

	#[error("host operation `{operation}` failed: {message}")]
	Host { operation: &'static str, message: String },

	/// [`load`](`crate::load`) found a live node that is neither text nor an element.
	#[error("live node can't be represented as a VNode")]
	UnsupportedNode,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
