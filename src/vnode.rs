//! The immutable description of a desired tree shape.

use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
};
use hashbrown::HashMap;
use std::rc::Rc;

/// Reserved prop name. Children live in [`Element::children`] and are never synchronized as an attribute.
pub const CHILDREN: &str = "children";

/// Props whose name starts with this and whose value is a [`Handler`] are event bindings.
pub const EVENT_PREFIX: &str = "on";

/// Attribute and event binding values by prop name.
pub type Props = HashMap<String, PropValue>;

/// A node of the virtual tree.
///
/// Numbers compare by how they render: `NaN` equals `NaN`, and `0.0` differs from `-0.0`.
#[derive(Debug, Clone)]
pub enum VNode {
	Text(String),
	Number(f64),
	Element(Element),
}

impl VNode {
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}

	/// Whether this is a text or number leaf.
	#[must_use]
	pub fn is_primitive(&self) -> bool {
		!matches!(self, Self::Element(_))
	}

	/// The text a primitive leaf renders as, or [`None`] for elements.
	#[must_use]
	pub fn text_content(&self) -> Option<String> {
		match self {
			Self::Text(text) => Some(text.clone()),
			Self::Number(number) => Some(number.to_string()),
			Self::Element(_) => None,
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Self::Element(element) => Some(element),
			Self::Text(_) | Self::Number(_) => None,
		}
	}
}

impl PartialEq for VNode {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => same_number(*a, *b),
			(Self::Element(a), Self::Element(b)) => a == b,
			_ => false,
		}
	}
}

/// Whether two numbers render to the same text.
///
/// `f64`'s `Display` is exact for everything but `NaN` payloads, so this is bit equality with all `NaN`s merged.
#[must_use]
pub fn same_number(a: f64, b: f64) -> bool {
	a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

impl From<Element> for VNode {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}

impl From<&str> for VNode {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for VNode {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<f64> for VNode {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl From<i32> for VNode {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

/// An element VNode: tag name, props and positional children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	pub name: String,
	pub props: Props,
	pub children: Vec<VNode>,
}

impl Element {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			props: Props::new(),
			children: Vec::new(),
		}
	}

	/// Sets a prop. `"children"` is reserved and ignored with a warning; use [`Element::child`] instead.
	#[must_use]
	pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
		let name = name.into();
		if name == CHILDREN {
			tracing::warn!("Ignoring prop named {:?}. Children are passed separately.", CHILDREN);
			return self;
		}
		self.props.insert(name, value.into());
		self
	}

	/// Appends a child, flattening [`Child::Many`] by one level.
	#[must_use]
	pub fn child(mut self, child: impl Into<Child>) -> Self {
		child.into().push_onto(&mut self.children);
		self
	}

	#[must_use]
	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Child>,
	{
		for child in children {
			child.into().push_onto(&mut self.children);
		}
		self
	}
}

/// One entry of a child list as handed to [`h`] or [`Element::child`].
///
/// [`Child::Many`] is spliced into the parent's children, which keeps [`Element::children`] flat.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
	One(VNode),
	Many(Vec<VNode>),
}

impl Child {
	fn push_onto(self, children: &mut Vec<VNode>) {
		match self {
			Self::One(node) => children.push(node),
			Self::Many(nodes) => children.extend(nodes),
		}
	}
}

impl From<VNode> for Child {
	fn from(node: VNode) -> Self {
		Self::One(node)
	}
}

impl From<Element> for Child {
	fn from(element: Element) -> Self {
		Self::One(element.into())
	}
}

impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Self::One(text.into())
	}
}

impl From<String> for Child {
	fn from(text: String) -> Self {
		Self::One(text.into())
	}
}

impl From<f64> for Child {
	fn from(number: f64) -> Self {
		Self::One(number.into())
	}
}

impl From<i32> for Child {
	fn from(number: i32) -> Self {
		Self::One(number.into())
	}
}

impl From<Vec<VNode>> for Child {
	fn from(nodes: Vec<VNode>) -> Self {
		Self::Many(nodes)
	}
}

/// Builds an element VNode.
///
/// ```
/// use vnode_dom::{h, props, Child, VNode};
///
/// let items = vec![VNode::text("b"), VNode::text("c")];
/// let list = h(
/// 	"ul",
/// 	props! { "className" => "list" },
/// 	vec![Child::from(h("li", props! {}, vec!["a"])), Child::from(items)],
/// );
///
/// assert_eq!(list.as_element().unwrap().children.len(), 3);
/// ```
pub fn h<C>(name: impl Into<String>, props: Props, children: C) -> VNode
where
	C: IntoIterator,
	C::Item: Into<Child>,
{
	let mut element = Element::new(name).children(children);
	for (name, value) in props {
		element = element.prop(name, value);
	}
	element.into()
}

/// Builds [`Props`] from `name => value` pairs.
#[macro_export]
macro_rules! props {
	($($name:expr => $value:expr),* $(,)?) => {{
		#[allow(unused_mut)]
		let mut props = $crate::Props::new();
		$(props.insert(::std::string::String::from($name), $crate::PropValue::from($value));)*
		props
	}};
}

/// A prop's value.
///
/// Equality is by value, except for [`PropValue::Handler`], which compares by [`Handler`] identity.
/// Numbers compare like [`same_number`].
#[derive(Debug, Clone)]
pub enum PropValue {
	/// "Not set", like `null` or `undefined`.
	Null,
	Bool(bool),
	Text(String),
	Number(f64),
	Handler(Handler),
}

impl PropValue {
	/// `Null` and `false` mean "attribute absent".
	#[must_use]
	pub fn is_suppressed(&self) -> bool {
		matches!(self, Self::Null | Self::Bool(false))
	}

	/// The attribute text for plain values.
	#[must_use]
	pub fn to_attribute_value(&self) -> Option<String> {
		match self {
			Self::Null | Self::Bool(false) | Self::Handler(_) => None,
			Self::Bool(true) => Some("true".to_owned()),
			Self::Text(text) => Some(text.clone()),
			Self::Number(number) => Some(number.to_string()),
		}
	}

	#[must_use]
	pub fn as_handler(&self) -> Option<&Handler> {
		match self {
			Self::Handler(handler) => Some(handler),
			_ => None,
		}
	}
}

impl PartialEq for PropValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => same_number(*a, *b),
			(Self::Handler(a), Self::Handler(b)) => a == b,
			_ => false,
		}
	}
}

impl From<&str> for PropValue {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for PropValue {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for PropValue {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl From<i32> for PropValue {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

impl From<Handler> for PropValue {
	fn from(handler: Handler) -> Self {
		Self::Handler(handler)
	}
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// An event as seen by a [`Handler`].
#[derive(Clone, Copy)]
pub struct Event<'a> {
	name: &'a str,
	native: &'a dyn Any,
}

impl<'a> Event<'a> {
	pub fn new(name: &'a str, native: &'a dyn Any) -> Self {
		Self { name, native }
	}

	/// The lowercase event name, like `"click"`.
	#[must_use]
	pub fn name(&self) -> &'a str {
		self.name
	}

	/// The host's own event value, e.g. a [`web_sys::Event`](https://docs.rs/web-sys/0.3/web_sys/struct.Event.html) for the web host.
	#[must_use]
	pub fn native<T: Any>(&self) -> Option<&'a T> {
		self.native.downcast_ref()
	}
}

impl Debug for Event<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event").field("name", &self.name).finish_non_exhaustive()
	}
}

/// A shareable event callback.
///
/// Clones are the same handler. Two separately created handlers are never equal, even with identical code,
/// which is what lets listeners be removed by exact reference.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event<'_>)>);

impl Handler {
	pub fn new(callback: impl 'static + Fn(&Event<'_>)) -> Self {
		Self(Rc::new(callback))
	}

	pub fn call(&self, event: &Event<'_>) {
		(self.0)(event)
	}

	fn address(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}

impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		self.address() == other.address()
	}
}

impl Eq for Handler {}

impl Hash for Handler {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.address().hash(state)
	}
}

impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Handler({:#x})", self.address())
	}
}
