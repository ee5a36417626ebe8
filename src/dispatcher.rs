//! Broadcasting actions to registered stores.

use crate::store::HandleAction;
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::{collections::VecDeque, rc::Rc};
use tracing::{instrument, trace, trace_span};

/// Identifies one [`Dispatcher::register`] registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

/// Delivers each action to every registered store, in registration order.
///
/// Pass this around by reference to whatever needs to publish actions. Nothing about it is global.
///
/// Actions dispatched while another action is being delivered (for example from a store listener) are queued
/// and delivered afterwards, one at a time and first-in first-out. Each action reaches the stores
/// that are registered when its own delivery starts.
pub struct Dispatcher<A> {
	stores: RefCell<Vec<(StoreId, Rc<dyn HandleAction<A>>)>>,
	queue: RefCell<VecDeque<A>>,
	draining: Cell<bool>,
	next_id: Cell<u64>,
}

impl<A> Dispatcher<A> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			stores: RefCell::default(),
			queue: RefCell::default(),
			draining: Cell::new(false),
			next_id: Cell::new(0),
		}
	}

	pub fn register(&self, store: Rc<dyn HandleAction<A>>) -> StoreId {
		let id = StoreId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		self.stores.borrow_mut().push((id, store));
		trace!(?id, "Registered store.");
		id
	}

	/// Returns whether the store was still registered.
	pub fn unregister(&self, id: StoreId) -> bool {
		let mut stores = self.stores.borrow_mut();
		let before = stores.len();
		stores.retain(|(s, _)| *s != id);
		stores.len() != before
	}

	#[must_use]
	pub fn store_count(&self) -> usize {
		self.stores.borrow().len()
	}

	/// Delivers `action`, or queues it if called from within another delivery.
	#[instrument(skip(self, action))]
	pub fn dispatch(&self, action: A) {
		self.queue.borrow_mut().push_back(action);
		if self.draining.get() {
			trace!("queue.len()" = self.queue.borrow().len(), "Queued nested action.");
			return;
		}

		let _draining = Draining::start(&self.draining);
		loop {
			let action = match self.queue.borrow_mut().pop_front() {
				Some(action) => action,
				None => break,
			};
			let stores: Vec<_> = self.stores.borrow().iter().map(|(_, store)| Rc::clone(store)).collect();
			let span = trace_span!("Delivering action", "stores.len()" = stores.len());
			let _enter = span.enter();
			for store in stores {
				store.handle_action(&action)
			}
		}
	}
}

impl<A> Default for Dispatcher<A> {
	fn default() -> Self {
		Self::new()
	}
}

impl<A> Debug for Dispatcher<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dispatcher")
			.field("stores.len()", &self.stores.borrow().len())
			.field("queue.len()", &self.queue.borrow().len())
			.field("draining", &self.draining.get())
			.finish()
	}
}

/// Resets the draining flag on drop, including while unwinding.
struct Draining<'a>(&'a Cell<bool>);
impl<'a> Draining<'a> {
	fn start(flag: &'a Cell<bool>) -> Self {
		flag.set(true);
		Self(flag)
	}
}
impl Drop for Draining<'_> {
	fn drop(&mut self) {
		self.0.set(false)
	}
}
