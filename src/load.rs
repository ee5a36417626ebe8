//! Reading live trees back into [`VNode`]s.
//!
//! Listeners and the direct value slot aren't observable through [`Host::describe`], so loaded elements only carry attributes.

use crate::{
	diff::{attribute_name, CLASS_NAME},
	host::NodeShape,
	Element, Error, Host, PropValue, Result, VNode,
};
use tracing::{instrument, trace};

/// # Errors
///
/// [`Error::UnsupportedNode`] if the subtree contains anything other than text and elements.
/// [`Error::DepthLimitReached`] if it's nested deeper than `depth_limit`.
#[instrument(skip(host))]
pub fn load_node<H: Host>(host: &H, node: &H::Node, depth_limit: usize) -> Result<VNode> {
	if depth_limit == 0 {
		return Err(Error::DepthLimitReached);
	}
	match host.describe(node) {
		NodeShape::Text(text) => Ok(VNode::Text(text)),
		NodeShape::Element { name, attributes } => Ok(VNode::Element(load_element(host, node, name, attributes, depth_limit)?)),
		NodeShape::Other => Err(Error::UnsupportedNode),
	}
}

fn load_element<H: Host>(host: &H, node: &H::Node, name: String, attributes: Vec<(String, String)>, depth_limit: usize) -> Result<Element> {
	let mut element = Element::new(name);
	for (name, value) in attributes {
		element.props.insert(load_attribute_name(name), PropValue::Text(value));
	}
	element.children = load_child_nodes(host, node, depth_limit - 1)?;
	trace!(tag = element.name.as_str(), "props.len()" = element.props.len(), "children.len()" = element.children.len(), "Loaded element.");
	Ok(element)
}

/// # Errors
///
/// Like [`load_node`], for each child.
pub fn load_child_nodes<H: Host>(host: &H, parent: &H::Node, depth_limit: usize) -> Result<Vec<VNode>> {
	(0..host.child_count(parent))
		.filter_map(|i| host.child_at(parent, i))
		.map(|child| load_node(host, &child, depth_limit))
		.collect()
}

/// `"class"` → `"className"`, so that the loaded prop syncs back to the same attribute.
fn load_attribute_name(name: String) -> String {
	if attribute_name(CLASS_NAME) == name {
		CLASS_NAME.to_owned()
	} else {
		name
	}
}
