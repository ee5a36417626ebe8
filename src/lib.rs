//! A minimal VDOM reconciler.
//!
//! [`VNode`] trees are diffed position by position against the tree rendered before,
//! and a live [`Host`] tree is patched to match with as few mutations as possible:
//! unchanged attributes and listeners are never touched, changed listeners are removed by their exact [`Handler`],
//! and only subtrees whose kind or tag name changed are recreated.
//!
//! ```
//! use vnode_dom::{memory::MemoryDom, Element, Renderer};
//!
//! let mut dom = MemoryDom::new();
//! let container = dom.create_container("main");
//! let mut renderer = Renderer::new(dom);
//!
//! renderer.render(Element::new("p").prop("className", "greeting").child("Hello!").into(), &container)?;
//! assert_eq!(renderer.host().to_html(container), r#"<main><p class="greeting">Hello!</p></main>"#);
//! # Ok::<(), vnode_dom::Error>(())
//! ```
//!
//! [`Store`] and [`Dispatcher`] provide the state side: actions are reduced into state, and a store listener
//! maps the new state to a fresh [`VNode`] tree for [`Renderer::render`].

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod diff;
pub mod dispatcher;
mod error;
pub mod host;
pub mod load;
pub mod memory;
mod options;
mod renderer;
pub mod store;
pub mod vnode;

#[cfg(feature = "web")]
mod rc_hash_map;
#[cfg(feature = "web")]
pub mod web;

pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use host::Host;
pub use options::Options;
pub use renderer::Renderer;
pub use store::Store;
pub use vnode::{h, Child, Element, Event, Handler, PropValue, Props, VNode};
