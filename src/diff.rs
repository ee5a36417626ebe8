//! Positional diffing of [`VNode`] trees against a live [`Host`] tree.
//!
//! # Correct Use
//!
//! The `old` trees passed in here must describe the live nodes exactly as the previous pass left them.
//! Out-of-band changes to the live tree desynchronize the two, which shows up as
//! [`Error::IndexOutOfRange`] or as stale attributes and listeners that are never removed.

use crate::{
	vnode::{same_number, CHILDREN, EVENT_PREFIX},
	Element, Error, Handler, Host, PropValue, Props, Result, VNode,
};
use core::cmp::min;
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Prop name that targets the live node's direct value slot.
pub const VALUE: &str = "value";

/// Prop name that targets the `class` attribute.
pub const CLASS_NAME: &str = "className";

/// Creates a brand-new live subtree for `vnode`. Nothing is attached to a parent.
///
/// # Errors
///
/// - [`Error::DepthLimitReached`] if the tree is nested deeper than `depth_limit`.
/// - [`Error::Host`] if the host refuses to create an element.
#[instrument(skip(host, vnode))]
pub fn materialize<H: Host>(host: &mut H, vnode: &VNode, depth_limit: usize) -> Result<H::Node> {
	if depth_limit == 0 {
		error!("Depth limit reached");
		return Err(Error::DepthLimitReached);
	}

	match vnode {
		VNode::Text(_) | VNode::Number(_) => {
			let text = vnode.text_content().unwrap_or_default();
			let span = trace_span!("Creating text node", text = redact(&text));
			let _enter = span.enter();
			Ok(host.create_text_node(&text))
		}
		VNode::Element(Element { name, props, children }) => {
			let span = trace_span!("Creating element", tag = name.as_str(), "props.len()" = props.len(), "children.len()" = children.len());
			let _enter = span.enter();
			let node = host.create_element(name)?;
			for (prop_name, value) in props {
				if prop_name == CHILDREN {
					continue;
				}
				bind(host, &node, binding(prop_name, value));
			}
			for child in children {
				let child = materialize(host, child, depth_limit - 1)?;
				host.append_child(&node, &child);
			}
			Ok(node)
		}
	}
}

/// Updates `node`'s attributes, value slot and listeners from `old_props` to `new_props`.
///
/// Entries that compare equal are not touched at all, so `sync_props(host, node, props, props)` is free.
/// Listeners are always removed with the exact [`Handler`] they were added with.
#[instrument(skip(host, new_props, old_props))]
pub fn sync_props<H: Host>(host: &mut H, node: &H::Node, new_props: &Props, old_props: &Props) {
	for (name, old_value) in old_props {
		if name == CHILDREN || new_props.contains_key(name) {
			continue;
		}
		let span = trace_span!("Removing prop", name = name.as_str());
		let _enter = span.enter();
		unbind(host, node, binding(name, old_value));
	}

	for (name, new_value) in new_props {
		if name == CHILDREN {
			continue;
		}
		let old_value = old_props.get(name);
		if old_value == Some(new_value) {
			continue;
		}

		let span = trace_span!("Updating prop", name = name.as_str());
		let _enter = span.enter();
		let old = old_value.map_or(Binding::Absent, |old_value| binding(name, old_value));
		match (old, binding(name, new_value)) {
			// Overwrites in place.
			(Binding::Attribute { .. }, new @ Binding::Attribute { .. }) | (Binding::Value(_), new @ Binding::Value(_)) => bind(host, node, new),
			(old, new) => {
				unbind(host, node, old);
				bind(host, node, new);
			}
		}
	}
}

/// Patches the live child at `index` of `parent` from `old` to `new`.
///
/// - Only `new`: materializes it and **appends** it to `parent`.
/// - Only `old`: removes the live child at `index`.
/// - Elements with the same name: keeps the live element, [syncs its props](`sync_props`) and recurses into children by position.
/// - Anything else that differs: replaces the live child wholesale.
///
/// Listener bindings of removed or replaced subtrees are handed to [`Host::release_listener`].
///
/// # Errors
///
/// - [`Error::IndexOutOfRange`] if `parent` has no live child at `index` where one is needed.
/// - [`Error::DepthLimitReached`] if the trees are nested deeper than `depth_limit`.
/// - [`Error::Host`] if a replacement can't be created.
#[instrument(skip(host, new, old))]
pub fn reconcile<H: Host>(host: &mut H, parent: &H::Node, new: Option<&VNode>, old: Option<&VNode>, index: usize, depth_limit: usize) -> Result<()> {
	let (new, old) = match (new, old) {
		(None, None) => return Ok(()),
		(Some(new), None) => {
			let span = trace_span!("Appending", index);
			let _enter = span.enter();
			let node = materialize(host, new, depth_limit)?;
			host.append_child(parent, &node);
			return Ok(());
		}
		(None, Some(old)) => {
			let span = trace_span!("Removing", index);
			let _enter = span.enter();
			check_index(host, parent, index)?;
			host.remove_child(parent, index);
			release_listeners(host, old);
			return Ok(());
		}
		(Some(new), Some(old)) => (new, old),
	};

	if depth_limit == 0 {
		error!("Depth limit reached");
		return Err(Error::DepthLimitReached);
	}

	match (new, old) {
		(VNode::Element(e_new), VNode::Element(e_old)) if e_new.name == e_old.name => {
			let span = trace_span!("Diffing element", tag = e_new.name.as_str(), index);
			let _enter = span.enter();
			let node = live_child(host, parent, index)?;
			update_element(host, &node, e_new, e_old, depth_limit)
		}
		(new, old) if differs(new, old) => {
			let span = trace_span!("Replace mismatching", index);
			let _enter = span.enter();

			if STATIC_MAX_LEVEL >= Level::WARN {
				if let (VNode::Element(e_new), VNode::Element(e_old)) = (new, old) {
					if e_new.name.eq_ignore_ascii_case(&e_old.name) {
						warn!("Recreating element due to different tag name casing: {:?} -> {:?}", e_old.name, e_new.name)
					}
				}
			}

			check_index(host, parent, index)?;
			let node = materialize(host, new, depth_limit)?;
			host.replace_child(parent, index, &node);
			release_listeners(host, old);
			Ok(())
		}
		_ => {
			trace!(index, "Unchanged primitive.");
			Ok(())
		}
	}
}

/// Checks that every node of `vnode` lies within `depth_limit` levels, the root being level 1.
///
/// [`reconcile`] and [`materialize`] visit each node of their new tree at exactly that level,
/// so a tree that passes this won't fail them with [`Error::DepthLimitReached`].
///
/// # Errors
///
/// [`Error::DepthLimitReached`] if it doesn't.
pub fn check_depth(vnode: &VNode, depth_limit: usize) -> Result<()> {
	if depth_limit == 0 {
		error!("Depth limit reached");
		return Err(Error::DepthLimitReached);
	}
	match vnode {
		VNode::Text(_) | VNode::Number(_) => Ok(()),
		VNode::Element(element) => element.children.iter().try_for_each(|child| check_depth(child, depth_limit - 1)),
	}
}

/// Releases each listener binding of the discarded tree `old` through [`Host::release_listener`].
///
/// Returns how many were released.
fn release_listeners<H: Host>(host: &mut H, old: &VNode) -> usize {
	let element = match old {
		VNode::Text(_) | VNode::Number(_) => return 0,
		VNode::Element(element) => element,
	};
	let span = trace_span!("Releasing listeners of element", tag = element.name.as_str());
	let _enter = span.enter();

	let mut released = 0;
	for (name, value) in &element.props {
		if let (PropValue::Handler(handler), Some(event)) = (value, event_name(name)) {
			trace!(event = event.as_str(), ?handler, "Releasing listener.");
			host.release_listener(&event, handler);
			released += 1;
		}
	}
	released + element.children.iter().map(|child| release_listeners(host, child)).sum::<usize>()
}

fn update_element<H: Host>(host: &mut H, node: &H::Node, e_new: &Element, e_old: &Element, depth_limit: usize) -> Result<()> {
	debug_assert_eq!(e_new.name, e_old.name);

	sync_props(host, node, &e_new.props, &e_old.props);

	let (c_new, c_old) = (&e_new.children, &e_old.children);
	let common = min(c_new.len(), c_old.len());
	for (i, (new, old)) in c_new.iter().zip(c_old).enumerate() {
		reconcile(host, node, Some(new), Some(old), i, depth_limit - 1)?;
	}
	for (i, new) in c_new.iter().enumerate().skip(common) {
		reconcile(host, node, Some(new), None, i, depth_limit - 1)?;
	}
	// Back to front, so that each removal leaves the remaining indices in place.
	for (i, old) in c_old.iter().enumerate().skip(common).rev() {
		reconcile(host, node, None, Some(old), i, depth_limit - 1)?;
	}
	Ok(())
}

/// Whether `old` can't be patched into `new` in place.
fn differs(new: &VNode, old: &VNode) -> bool {
	match (new, old) {
		(VNode::Text(t_new), VNode::Text(t_old)) => t_new != t_old,
		(VNode::Number(n_new), VNode::Number(n_old)) => !same_number(*n_new, *n_old),
		(VNode::Element(e_new), VNode::Element(e_old)) => e_new.name != e_old.name,
		_ => true,
	}
}

fn live_child<H: Host>(host: &H, parent: &H::Node, index: usize) -> Result<H::Node> {
	host.child_at(parent, index).ok_or_else(|| out_of_range(host, parent, index))
}

fn check_index<H: Host>(host: &H, parent: &H::Node, index: usize) -> Result<()> {
	if index < host.child_count(parent) {
		Ok(())
	} else {
		Err(out_of_range(host, parent, index))
	}
}

fn out_of_range<H: Host>(host: &H, parent: &H::Node, index: usize) -> Error {
	let len = host.child_count(parent);
	error!(index, len, "Expected a live child beyond the end of the parent's child list. Was the live tree changed out-of-band?");
	Error::IndexOutOfRange { index, len }
}

/// How one prop shows up on a live node.
#[derive(Debug)]
enum Binding<'a> {
	Listener { event: String, handler: &'a Handler },
	Attribute { name: &'a str, value: String },
	Value(String),
	/// Suppressed, or nothing the live node can hold.
	Absent,
}

fn binding<'a>(name: &'a str, value: &'a PropValue) -> Binding<'a> {
	match value {
		PropValue::Handler(handler) => match event_name(name) {
			Some(event) => Binding::Listener { event, handler },
			None => {
				warn!("Ignoring handler bound to {:?}, which is not an event prop. Event props start with {:?}.", name, EVENT_PREFIX);
				Binding::Absent
			}
		},
		value => match value.to_attribute_value() {
			None => Binding::Absent,
			Some(value) if name == VALUE => Binding::Value(value),
			Some(value) => Binding::Attribute {
				name: attribute_name(name),
				value,
			},
		},
	}
}

fn bind<H: Host>(host: &mut H, node: &H::Node, binding: Binding<'_>) {
	match binding {
		Binding::Listener { event, handler } => {
			trace!(event = event.as_str(), ?handler, "Adding listener.");
			host.add_listener(node, &event, handler)
		}
		Binding::Attribute { name, value } => {
			trace!(name, value = redact(&value), "Setting attribute.");
			host.set_attribute(node, name, &value)
		}
		Binding::Value(value) => {
			trace!(value = redact(&value), "Setting value.");
			host.set_value(node, &value)
		}
		Binding::Absent => (),
	}
}

fn unbind<H: Host>(host: &mut H, node: &H::Node, binding: Binding<'_>) {
	match binding {
		Binding::Listener { event, handler } => {
			trace!(event = event.as_str(), ?handler, "Removing listener.");
			host.remove_listener(node, &event, handler)
		}
		Binding::Attribute { name, .. } => {
			trace!(name, "Removing attribute.");
			host.remove_attribute(node, name)
		}
		Binding::Value(_) => {
			trace!("Clearing value.");
			host.set_value(node, "")
		}
		Binding::Absent => (),
	}
}

/// `"onClick"` → `"click"`.
#[must_use]
pub fn event_name(prop_name: &str) -> Option<String> {
	match prop_name.strip_prefix(EVENT_PREFIX) {
		Some(suffix) if !suffix.is_empty() => Some(suffix.to_ascii_lowercase()),
		_ => None,
	}
}

/// The live attribute a plain prop is stored in.
#[must_use]
pub fn attribute_name(prop_name: &str) -> &str {
	if prop_name == CLASS_NAME {
		"class"
	} else {
		prop_name
	}
}

pub(crate) fn redact(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"[redacted]"
	}
}
