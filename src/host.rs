//! The live tree the differ patches.

use crate::{Handler, Result};
use core::{fmt::Debug, hash::Hash};

/// What [`load`](`crate::load`) can learn about a live node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeShape {
	Text(String),
	Element {
		name: String,
		/// `(name, value)` in the host's order. The `class` attribute is reported as `class`.
		attributes: Vec<(String, String)>,
	},
	/// Comments, processing instructions and the like.
	Other,
}

/// An ordered, mutable tree of addressable nodes.
///
/// Implementations don't have to validate positional arguments:
/// the differ checks indices against [`Host::child_count`] before calling [`Host::remove_child`] or [`Host::replace_child`].
pub trait Host {
	/// A cheap handle to a live node.
	type Node: Clone + Debug;

	/// Identifies a container across render calls.
	type Key: Clone + Debug + Eq + Hash;

	fn create_text_node(&mut self, content: &str) -> Self::Node;

	/// # Errors
	///
	/// Iff the host rejects the tag name.
	fn create_element(&mut self, name: &str) -> Result<Self::Node>;

	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

	/// Removing an absent attribute is a no-op.
	fn remove_attribute(&mut self, node: &Self::Node, name: &str);

	/// Writes the node's direct `value` slot, which is distinct from the `value` attribute.
	fn set_value(&mut self, node: &Self::Node, value: &str);

	fn add_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

	/// Removes the listener that was added with this exact `handler`.
	/// Removing a listener that was never added is a no-op.
	fn remove_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

	/// Called once per listener binding of a subtree the differ removed or replaced, after the host mutation.
	///
	/// The detached nodes are not walked, so their listeners stay registered on them.
	/// Hosts that count handler references release one here.
	fn release_listener(&mut self, _event: &str, _handler: &Handler) {}

	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

	fn remove_child(&mut self, parent: &Self::Node, index: usize);

	fn replace_child(&mut self, parent: &Self::Node, index: usize, child: &Self::Node);

	fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;

	fn child_count(&self, parent: &Self::Node) -> usize;

	fn container_key(&mut self, container: &Self::Node) -> Self::Key;

	fn describe(&self, node: &Self::Node) -> NodeShape;

	/// Drops whatever [`Host::container_key`] remembers about `container`.
	fn forget_container(&mut self, _container: &Self::Node) {}

	/// Called once at the end of each render pass.
	fn finish(&mut self) {}
}
