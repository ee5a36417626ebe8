//! A [`Host`] that patches a browser DOM through [`web_sys`].

use crate::{host::NodeShape, rc_hash_map::RcHashMap, Error, Event, Handler, Host, Result};
use core::convert::TryFrom;
use js_sys::{Function, Reflect};
use tracing::{error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// Patches [`web_sys::Node`]s created through one [`web_sys::Document`].
///
/// # Event Listeners
///
/// Each distinct [`Handler`] is wrapped into one JavaScript function, shared by every element and event it's bound to.
/// These are reference-counted per [`WebDom`] instance. Functions that are no longer bound anywhere are freed at the end of each render pass.
///
/// Removed and replaced subtrees are detached as they are, but their handler references are released.
/// Listeners on such detached nodes and listeners that are still bound when the [`WebDom`] is dropped
/// will start throwing errors into JavaScript once their function is freed and their event fires.
#[derive(Debug)]
pub struct WebDom {
	document: web_sys::Document,
	handler_handles: RcHashMap<Handler, u16, Closure<dyn Fn(web_sys::Event)>>,
	containers: Vec<(usize, web_sys::Node)>,
	next_container_key: usize,
}

impl WebDom {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			handler_handles: RcHashMap::new(),
			containers: Vec::new(),
			next_container_key: 0,
		}
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// How many distinct handlers currently have a JavaScript function.
	#[must_use]
	pub fn handler_count(&self) -> usize {
		self.handler_handles.len()
	}

	fn wrap_handler(handler: &Handler) -> Closure<dyn Fn(web_sys::Event)> {
		let handler = handler.clone();
		Closure::wrap(Box::new(move |event: web_sys::Event| {
			let name = event.type_();
			let span = trace_span!("Calling handler", name = name.as_str(), ?handler);
			let _enter = span.enter();
			handler.call(&Event::new(&name, &event))
		}) as Box<dyn Fn(web_sys::Event)>)
	}
}

fn nth_child(parent: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
	parent.child_nodes().get(u32::try_from(index).ok()?)
}

fn as_element<'a>(node: &'a web_sys::Node, purpose: &str) -> Option<&'a web_sys::Element> {
	let element = node.dyn_ref::<web_sys::Element>();
	if element.is_none() {
		error!("Expected an element to {} but found {:?}.", purpose, node);
	}
	element
}

impl Host for WebDom {
	type Node = web_sys::Node;
	type Key = usize;

	fn create_text_node(&mut self, content: &str) -> web_sys::Node {
		self.document.create_text_node(content).into()
	}

	fn create_element(&mut self, name: &str) -> Result<web_sys::Node> {
		self.document.create_element(name).map(Into::into).map_err(|error| {
			error!("Failed to create element <{}>: {:?}", name, error);
			Error::Host {
				operation: "createElement",
				message: format!("{:?}", error),
			}
		})
	}

	fn set_attribute(&mut self, node: &web_sys::Node, name: &str, value: &str) {
		if let Some(element) = as_element(node, "set an attribute on") {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Could not set attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn remove_attribute(&mut self, node: &web_sys::Node, name: &str) {
		if let Some(element) = as_element(node, "remove an attribute from") {
			if let Err(error) = element.remove_attribute(name) {
				warn!("Could not remove attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn set_value(&mut self, node: &web_sys::Node, value: &str) {
		match Reflect::set(node, &JsValue::from_str("value"), &JsValue::from_str(value)) {
			Ok(true) => (),
			Ok(false) => warn!("`value` of {:?} is read-only.", node),
			Err(error) => error!("Could not set `value`: {:?}", error),
		}
	}

	#[instrument(skip(self))]
	fn add_listener(&mut self, node: &web_sys::Node, event: &str, handler: &Handler) {
		let closure = match self.handler_handles.acquire(handler.clone(), Self::wrap_handler) {
			Ok(closure) => closure,
			Err(_) => return error!("Too many (more than 65k) active references to the same `Handler`."),
		};
		if let Err(error) = node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>()) {
			error!("Failed to add event listener {:?}: {:?}", event, error)
		}
	}

	#[instrument(skip(self))]
	fn remove_listener(&mut self, node: &web_sys::Node, event: &str, handler: &Handler) {
		let closure = match self.handler_handles.release(handler) {
			Ok(Some(closure)) => closure,
			Ok(None) => return trace!("Handler was never bound. Ignoring."),
			Err(_) => return warn!("Handler was removed more often than it was added. Ignoring."),
		};
		if let Err(error) = node.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>()) {
			error!("Failed to remove event listener {:?}: {:?}", event, error)
		}
	}

	fn release_listener(&mut self, event: &str, handler: &Handler) {
		match self.handler_handles.release(handler) {
			Ok(Some(_)) => (),
			Ok(None) => error!(event, "Released a handler that was never bound."),
			Err(_) => error!(event, "Released a handler more often than it was bound."),
		}
	}

	fn append_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.append_child(child) {
			error!("Failed to append node: {:?}", error)
		}
	}

	fn remove_child(&mut self, parent: &web_sys::Node, index: usize) {
		match nth_child(parent, index) {
			Some(child) => {
				if let Err(error) = parent.remove_child(&child) {
					error!("Failed to remove the node: {:?}", error)
				}
			}
			None => error!("Expected to remove a node beyond end of `web_sys::NodeList`. Ignoring."),
		}
	}

	fn replace_child(&mut self, parent: &web_sys::Node, index: usize, child: &web_sys::Node) {
		match nth_child(parent, index) {
			Some(replaced) => {
				if let Err(error) = parent.replace_child(child, &replaced) {
					error!("Failed to replace the node: {:?}", error)
				}
			}
			None => error!("Expected to replace a node beyond end of `web_sys::NodeList`. Ignoring."),
		}
	}

	fn child_at(&self, parent: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
		nth_child(parent, index)
	}

	fn child_count(&self, parent: &web_sys::Node) -> usize {
		parent.child_nodes().length() as usize
	}

	fn container_key(&mut self, container: &web_sys::Node) -> usize {
		if let Some((key, _)) = self.containers.iter().find(|(_, known)| known == container) {
			return *key;
		}
		let key = self.next_container_key;
		self.next_container_key += 1;
		self.containers.push((key, container.clone()));
		key
	}

	fn forget_container(&mut self, container: &web_sys::Node) {
		self.containers.retain(|(_, known)| known != container);
	}

	fn describe(&self, node: &web_sys::Node) -> NodeShape {
		match node.node_type() {
			web_sys::Node::TEXT_NODE => NodeShape::Text(node.text_content().unwrap_or_default()),
			web_sys::Node::ELEMENT_NODE => {
				let element = node.unchecked_ref::<web_sys::Element>();
				let attributes = element.attributes();
				NodeShape::Element {
					name: element.local_name(),
					attributes: (0..attributes.length())
						.filter_map(|i| attributes.item(i))
						.map(|attribute| (attribute.local_name(), attribute.value()))
						.collect(),
				}
			}
			_ => NodeShape::Other,
		}
	}

	fn finish(&mut self) {
		let freed = self.handler_handles.drain_released().count();
		trace!("Freed {} event listener function(s).", freed);
		info!("Event listener count/cached capacity: {}/{}", self.handler_handles.len(), self.handler_handles.capacity());
		if STATIC_MAX_LEVEL >= Level::WARN && self.handler_handles.len() >= 10_000 {
			warn!(
				"There are many ({}) distinct live handlers.\n\
				This may point to handlers being recreated on each render instead of being reused.",
				self.handler_handles.len()
			)
		}
	}
}
