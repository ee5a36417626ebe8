//! A reducer-driven state container.

use core::{
	cell::{Cell, Ref, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::{instrument, trace};

/// Identifies one [`Store::subscribe`] registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Reducer<S, A> = Box<dyn Fn(&S, &A) -> S>;
type Listener = Rc<dyn Fn()>;

/// Holds a state `S` that only changes by reducing actions `A` into it.
///
/// All methods take `&self`, so a store can be shared through an [`Rc`] with listeners and a
/// [`Dispatcher`](`crate::Dispatcher`).
///
/// # Re-entrancy
///
/// Listeners run synchronously and in subscription order after each state change.
/// A listener that calls [`Store::handle_action`] on the same store directly starts a nested round of notifications
/// before the outer one finishes; the resulting listener order is unspecified.
/// Dispatch through a [`Dispatcher`](`crate::Dispatcher`) instead, which queues nested actions.
pub struct Store<S, A> {
	state: RefCell<S>,
	reducer: Reducer<S, A>,
	listeners: RefCell<Vec<(Subscription, Listener)>>,
	next_subscription: Cell<u64>,
}

impl<S, A> Store<S, A> {
	pub fn new(initial_state: S, reducer: impl 'static + Fn(&S, &A) -> S) -> Self {
		Self {
			state: RefCell::new(initial_state),
			reducer: Box::new(reducer),
			listeners: RefCell::default(),
			next_subscription: Cell::new(0),
		}
	}

	/// Borrows the current state.
	///
	/// # Panics
	///
	/// Iff the returned [`Ref`] is still held while an action is being reduced.
	pub fn state(&self) -> Ref<'_, S> {
		self.state.borrow()
	}

	pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
		f(&self.state.borrow())
	}

	pub fn subscribe(&self, listener: impl 'static + Fn()) -> Subscription {
		let subscription = Subscription(self.next_subscription.get());
		self.next_subscription.set(subscription.0 + 1);
		self.listeners.borrow_mut().push((subscription, Rc::new(listener)));
		subscription
	}

	/// Returns whether the subscription was still active.
	pub fn unsubscribe(&self, subscription: Subscription) -> bool {
		let mut listeners = self.listeners.borrow_mut();
		let before = listeners.len();
		listeners.retain(|(s, _)| *s != subscription);
		listeners.len() != before
	}

	/// Reduces `action` into the state, then notifies every listener subscribed at that point.
	#[instrument(skip(self, action))]
	pub fn handle_action(&self, action: &A) {
		let next = (self.reducer)(&self.state.borrow(), action);
		*self.state.borrow_mut() = next;

		let listeners: Vec<Listener> = self.listeners.borrow().iter().map(|(_, listener)| Rc::clone(listener)).collect();
		trace!("listeners.len()" = listeners.len(), "Notifying.");
		for listener in listeners {
			listener()
		}
	}
}

impl<S: Debug, A> Debug for Store<S, A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Store")
			.field("state", &self.state)
			.field("listeners.len()", &self.listeners.borrow().len())
			.finish_non_exhaustive()
	}
}

/// Something a [`Dispatcher`](`crate::Dispatcher`) can deliver actions to.
pub trait HandleAction<A> {
	fn handle_action(&self, action: &A);
}

impl<S, A> HandleAction<A> for Store<S, A> {
	fn handle_action(&self, action: &A) {
		Store::handle_action(self, action)
	}
}
