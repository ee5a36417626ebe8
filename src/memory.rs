//! An in-memory [`Host`] with a mutation journal.
//!
//! Nodes live in an arena and are never freed, so a [`NodeId`] stays valid (and unique) for the lifetime of its [`MemoryDom`].
//! That makes "was this node reused?" a plain equality check.

use crate::{host::NodeShape, Error, Event, Handler, Host, Result};
use core::{any::Any, fmt::Write as _};
use tracing::{error, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One host call made by the differ, as recorded by [`MemoryDom`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateTextNode { node: NodeId, content: String },
	CreateElement { node: NodeId, name: String },
	SetAttribute { node: NodeId, name: String, value: String },
	RemoveAttribute { node: NodeId, name: String },
	SetValue { node: NodeId, value: String },
	AddListener { node: NodeId, event: String, handler: Handler },
	RemoveListener { node: NodeId, event: String, handler: Handler },
	ReleaseListener { event: String, handler: Handler },
	AppendChild { parent: NodeId, child: NodeId },
	RemoveChild { parent: NodeId, index: usize },
	ReplaceChild { parent: NodeId, index: usize, child: NodeId },
}

#[derive(Debug)]
enum Data {
	Text(String),
	Element {
		name: String,
		attributes: Vec<(String, String)>,
		value: Option<String>,
		listeners: Vec<(String, Handler)>,
	},
}

#[derive(Debug)]
struct Slot {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct MemoryDom {
	slots: Vec<Slot>,
	journal: Vec<Mutation>,
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element to render into. This isn't journaled.
	pub fn create_container(&mut self, name: &str) -> NodeId {
		self.insert(Data::Element {
			name: name.to_owned(),
			attributes: Vec::new(),
			value: None,
			listeners: Vec::new(),
		})
	}

	/// The host calls made so far.
	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.journal
	}

	/// Drains the journal.
	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		std::mem::take(&mut self.journal)
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.slot(node)?.parent
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		match self.slot(node) {
			Some(slot) => &slot.children,
			None => &[],
		}
	}

	/// The tag name of an element node.
	#[must_use]
	pub fn name(&self, node: NodeId) -> Option<&str> {
		match &self.slot(node)?.data {
			Data::Element { name, .. } => Some(name),
			Data::Text(_) => None,
		}
	}

	/// The content of a text node.
	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.slot(node)?.data {
			Data::Text(text) => Some(text),
			Data::Element { .. } => None,
		}
	}

	/// All text below `node`, in document order.
	#[must_use]
	pub fn text_content(&self, node: NodeId) -> String {
		match self.slot(node).map(|slot| &slot.data) {
			Some(Data::Text(text)) => text.clone(),
			Some(Data::Element { .. }) => self.children(node).iter().map(|&child| self.text_content(child)).collect(),
			None => String::new(),
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		self.attributes(node).iter().find(|(n, _)| n == name).map(|(_, value)| value.as_str())
	}

	#[must_use]
	pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
		match self.slot(node).map(|slot| &slot.data) {
			Some(Data::Element { attributes, .. }) => attributes,
			_ => &[],
		}
	}

	/// The direct value slot, if it was ever written.
	#[must_use]
	pub fn value(&self, node: NodeId) -> Option<&str> {
		match &self.slot(node)?.data {
			Data::Element { value, .. } => value.as_deref(),
			Data::Text(_) => None,
		}
	}

	#[must_use]
	pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
		self.handlers(node, event).len()
	}

	/// The handlers bound to `event` on `node`, in registration order.
	///
	/// Useful to fire an event without keeping `self` borrowed while the handlers run.
	#[must_use]
	pub fn handlers(&self, node: NodeId, event: &str) -> Vec<Handler> {
		match self.slot(node).map(|slot| &slot.data) {
			Some(Data::Element { listeners, .. }) => listeners.iter().filter(|(e, _)| e == event).map(|(_, handler)| handler.clone()).collect(),
			_ => Vec::new(),
		}
	}

	/// Calls the listeners registered for `event` on `node` (and only there, there's no bubbling) in registration order.
	///
	/// Returns how many listeners were called.
	pub fn dispatch(&self, node: NodeId, event: &str, native: &dyn Any) -> usize {
		let handlers = self.handlers(node, event);
		trace!(?node, event, "handlers.len()" = handlers.len(), "Dispatching.");
		for handler in &handlers {
			handler.call(&Event::new(event, native))
		}
		handlers.len()
	}

	/// A compact HTML-like rendering of `node`'s subtree, with attributes sorted by name. Listeners and value slots are left out.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		match self.slot(node).map(|slot| &slot.data) {
			Some(Data::Text(text)) => html.push_str(text),
			Some(Data::Element { name, attributes, .. }) => {
				let mut attributes: Vec<_> = attributes.iter().collect();
				attributes.sort();
				html.push('<');
				html.push_str(name);
				for (name, value) in attributes {
					// Infallible for `String`.
					let _ = write!(html, " {}={:?}", name, value);
				}
				html.push('>');
				for &child in self.children(node) {
					self.write_html(child, html)
				}
				let _ = write!(html, "</{}>", name);
			}
			None => (),
		}
	}

	fn insert(&mut self, data: Data) -> NodeId {
		let id = NodeId(self.slots.len());
		self.slots.push(Slot {
			data,
			parent: None,
			children: Vec::new(),
		});
		id
	}

	fn slot(&self, node: NodeId) -> Option<&Slot> {
		self.slots.get(node.0)
	}

	fn slot_mut(&mut self, node: NodeId) -> Option<&mut Slot> {
		let slot = self.slots.get_mut(node.0);
		if slot.is_none() {
			error!(?node, "Unknown node.");
		}
		slot
	}

	fn element_mut(&mut self, node: NodeId) -> Option<(&mut Vec<(String, String)>, &mut Option<String>, &mut Vec<(String, Handler)>)> {
		match &mut self.slot_mut(node)?.data {
			Data::Element { attributes, value, listeners, .. } => Some((attributes, value, listeners)),
			Data::Text(_) => {
				error!(?node, "Expected an element but found a text node.");
				None
			}
		}
	}

	/// Takes `child` out of its current parent, like the DOM does on insertion.
	fn detach(&mut self, child: NodeId) {
		let parent = match self.slot_mut(child).and_then(|slot| slot.parent.take()) {
			Some(parent) => parent,
			None => return,
		};
		if let Some(slot) = self.slot_mut(parent) {
			slot.children.retain(|&c| c != child);
		}
	}

	fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) {
		if let Some(slot) = self.slot_mut(child) {
			slot.parent = parent;
		}
	}
}

impl Host for MemoryDom {
	type Node = NodeId;
	type Key = NodeId;

	fn create_text_node(&mut self, content: &str) -> NodeId {
		let node = self.insert(Data::Text(content.to_owned()));
		self.journal.push(Mutation::CreateTextNode {
			node,
			content: content.to_owned(),
		});
		node
	}

	fn create_element(&mut self, name: &str) -> Result<NodeId> {
		// Roughly what `Document.createElement` rejects with an `InvalidCharacterError`.
		if name.is_empty() || name.chars().any(|c| c.is_whitespace() || "<>/\"'=".contains(c)) {
			error!(name, "Invalid tag name.");
			return Err(Error::Host {
				operation: "createElement",
				message: format!("invalid tag name {:?}", name),
			});
		}
		let node = self.create_container(name);
		self.journal.push(Mutation::CreateElement { node, name: name.to_owned() });
		Ok(node)
	}

	fn set_attribute(&mut self, &node: &NodeId, name: &str, value: &str) {
		self.journal.push(Mutation::SetAttribute {
			node,
			name: name.to_owned(),
			value: value.to_owned(),
		});
		if let Some((attributes, _, _)) = self.element_mut(node) {
			match attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => *existing = value.to_owned(),
				None => attributes.push((name.to_owned(), value.to_owned())),
			}
		}
	}

	fn remove_attribute(&mut self, &node: &NodeId, name: &str) {
		self.journal.push(Mutation::RemoveAttribute { node, name: name.to_owned() });
		if let Some((attributes, _, _)) = self.element_mut(node) {
			attributes.retain(|(n, _)| n != name);
		}
	}

	fn set_value(&mut self, &node: &NodeId, value: &str) {
		self.journal.push(Mutation::SetValue { node, value: value.to_owned() });
		if let Some((_, slot, _)) = self.element_mut(node) {
			*slot = Some(value.to_owned());
		}
	}

	fn add_listener(&mut self, &node: &NodeId, event: &str, handler: &Handler) {
		self.journal.push(Mutation::AddListener {
			node,
			event: event.to_owned(),
			handler: handler.clone(),
		});
		if let Some((_, _, listeners)) = self.element_mut(node) {
			// Same as `addEventListener`: identical registrations are discarded.
			if !listeners.iter().any(|(e, h)| e == event && h == handler) {
				listeners.push((event.to_owned(), handler.clone()));
			}
		}
	}

	fn remove_listener(&mut self, &node: &NodeId, event: &str, handler: &Handler) {
		self.journal.push(Mutation::RemoveListener {
			node,
			event: event.to_owned(),
			handler: handler.clone(),
		});
		if let Some((_, _, listeners)) = self.element_mut(node) {
			listeners.retain(|(e, h)| !(e == event && h == handler));
		}
	}

	/// Journaled only. Detached nodes keep their listeners, as in the DOM.
	fn release_listener(&mut self, event: &str, handler: &Handler) {
		self.journal.push(Mutation::ReleaseListener {
			event: event.to_owned(),
			handler: handler.clone(),
		});
	}

	fn append_child(&mut self, &parent: &NodeId, &child: &NodeId) {
		self.journal.push(Mutation::AppendChild { parent, child });
		self.detach(child);
		if let Some(slot) = self.slot_mut(parent) {
			slot.children.push(child);
			self.set_parent(child, Some(parent));
		}
	}

	fn remove_child(&mut self, &parent: &NodeId, index: usize) {
		self.journal.push(Mutation::RemoveChild { parent, index });
		let removed = match self.slot_mut(parent) {
			Some(slot) if index < slot.children.len() => slot.children.remove(index),
			_ => return error!(?parent, index, "Child to remove not found."),
		};
		self.set_parent(removed, None);
	}

	fn replace_child(&mut self, &parent: &NodeId, index: usize, &child: &NodeId) {
		self.journal.push(Mutation::ReplaceChild { parent, index, child });
		self.detach(child);
		let replaced = match self.slot_mut(parent) {
			Some(slot) if index < slot.children.len() => std::mem::replace(&mut slot.children[index], child),
			_ => return error!(?parent, index, "Child to replace not found."),
		};
		self.set_parent(replaced, None);
		self.set_parent(child, Some(parent));
	}

	fn child_at(&self, &parent: &NodeId, index: usize) -> Option<NodeId> {
		self.children(parent).get(index).copied()
	}

	fn child_count(&self, &parent: &NodeId) -> usize {
		self.children(parent).len()
	}

	fn container_key(&mut self, &container: &NodeId) -> NodeId {
		container
	}

	fn describe(&self, &node: &NodeId) -> NodeShape {
		match self.slot(node).map(|slot| &slot.data) {
			Some(Data::Text(text)) => NodeShape::Text(text.clone()),
			Some(Data::Element { name, attributes, .. }) => NodeShape::Element {
				name: name.clone(),
				attributes: attributes.clone(),
			},
			None => NodeShape::Other,
		}
	}
}
