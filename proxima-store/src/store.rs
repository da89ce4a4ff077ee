//! Observable store

// Imports
use {
	crate::{
		ChangeEvent,
		Dependencies,
		Interception,
		ReinitEvent,
		StoreError,
		Tracked,
		dispatch::Dispatch,
		registry::{ChangeFn, Registry, ReinitFn, SubscriberId},
	},
	core::{fmt, mem},
	proxima_sync_types::{Exclusive, IMut, IMutExt, Rc, SyncBounds, Weak},
	proxima_value::{Key, Value},
};

/// Store state
enum State {
	/// Never set
	Unset,

	/// Holds a value
	Active(Tracked),
}

/// Store inner
pub(crate) struct Inner {
	/// Exclusive section for writes and their dispatch
	pub(crate) exclusive: Exclusive,

	/// Current value
	current: IMut<State>,

	/// Subscribers
	registry: Registry,

	/// Top-level change listener
	on_change: Option<Rc<ChangeFn>>,

	/// Top-level reinit listener
	on_reinit: Option<Rc<ReinitFn>>,

	/// Name, for diagnostics
	name: Option<String>,
}

impl Inner {
	/// Returns the current value
	pub(crate) fn current(&self) -> Tracked {
		match &*self.current.imut_read() {
			State::Unset => Tracked::unset(),
			State::Active(current) => current.clone(),
		}
	}

	/// Emits a change to all matching subscribers, and then to the top-level listener
	pub(crate) fn emit_change(&self, property: Key, current: Value, previous: Value) {
		let event = ChangeEvent {
			property,
			current,
			previous,
		};
		tracing::trace!(name = ?self.name, ?event, "Emitting change");

		let whole = self.current();
		let mut dispatch = Dispatch::new();
		for subscriber in self.registry.snapshot() {
			let matches = dispatch.run(&*subscriber, || subscriber.dependencies().matches(&event, &whole));
			if matches == Some(true) {
				dispatch.run(&*subscriber, || subscriber.change(&event));
			}
		}

		if let Some(on_change) = &self.on_change {
			dispatch.run(&"top-level change listener", || on_change(&event));
		}

		dispatch.finish();
	}

	/// Emits a reinit to all subscribers, and then to the top-level listener
	fn emit_reinit(&self, event: &ReinitEvent) {
		tracing::debug!(name = ?self.name, ?event, "Emitting reinit");

		let mut dispatch = Dispatch::new();
		for subscriber in self.registry.snapshot() {
			dispatch.run(&*subscriber, || subscriber.reinit(event));
		}

		if let Some(on_reinit) = &self.on_reinit {
			dispatch.run(&"top-level reinit listener", || on_reinit(event));
		}

		dispatch.finish();
	}
}

/// Store builder
#[must_use = "A store builder does nothing until built"]
pub struct StoreBuilder {
	/// Initial value
	initial: Value,

	/// Top-level change listener
	on_change: Option<Rc<ChangeFn>>,

	/// Top-level reinit listener
	on_reinit: Option<Rc<ReinitFn>>,

	/// Interception primitive
	interception: Interception,

	/// Name
	name: Option<String>,
}

impl StoreBuilder {
	/// Sets the top-level change listener.
	///
	/// It's called after the subscribers on every write, regardless of dependencies.
	pub fn on_change<F>(mut self, f: F) -> Self
	where
		F: Fn(&ChangeEvent) + SyncBounds + 'static,
	{
		self.on_change = Some(Rc::new(f));
		self
	}

	/// Sets the top-level reinit listener.
	///
	/// It's called after the subscribers on every reinit, including the initial one.
	pub fn on_reinit<F>(mut self, f: F) -> Self
	where
		F: Fn(&ReinitEvent) + SyncBounds + 'static,
	{
		self.on_reinit = Some(Rc::new(f));
		self
	}

	/// Sets the interception primitive
	pub const fn interception(mut self, interception: Interception) -> Self {
		self.interception = interception;
		self
	}

	/// Sets the name of the store
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Builds the store.
	///
	/// The initial value is set before this returns, so the top-level reinit listener
	/// is called with it.
	pub fn build(self) -> Result<Store, StoreError> {
		if !self.interception.is_available() {
			tracing::error!(name = ?self.name, interception = ?self.interception, "Unable to create store");
			return Err(StoreError::EnvironmentUnsupported);
		}

		let inner = Inner {
			exclusive: Exclusive::new(),
			current: IMut::new(State::Unset),
			registry: Registry::new(),
			on_change: self.on_change,
			on_reinit: self.on_reinit,
			name: self.name,
		};
		let store = Store { inner: Rc::new(inner) };
		_ = store.set(self.initial);

		Ok(store)
	}
}

/// Observable store.
///
/// Cloning the store yields another handle to the same store.
pub struct Store {
	/// Inner
	inner: Rc<Inner>,
}

impl Store {
	/// Creates a new store
	pub fn new(initial: impl Into<Value>) -> Result<Self, StoreError> {
		Self::builder(initial).build()
	}

	/// Creates a builder for a store
	pub fn builder(initial: impl Into<Value>) -> StoreBuilder {
		StoreBuilder {
			initial:      initial.into(),
			on_change:    None,
			on_reinit:    None,
			interception: Interception::detect(),
			name:         None,
		}
	}

	/// Returns the name of this store
	#[must_use]
	pub fn name(&self) -> Option<&str> {
		self.inner.name.as_deref()
	}

	/// Gets the current value
	#[must_use]
	pub fn get(&self) -> Tracked {
		self.inner.current()
	}

	/// Sets the value.
	///
	/// If `value` is the current value, nothing happens. Otherwise, all subscribers
	/// receive a reinit event before this returns.
	///
	/// Returns the current value.
	pub fn set(&self, value: impl Into<Value>) -> Tracked {
		let value = value.into();
		let inner = &*self.inner;
		let _exclusive = inner.exclusive.enter();

		let (current, previous) = {
			let mut state = inner.current.imut_write();
			if let State::Active(current) = &*state &&
				current.is(&value)
			{
				tracing::trace!(name = ?inner.name, ?value, "Value is already the current value, ignoring");
				return current.clone();
			}

			let current = Tracked::wrap(value, Rc::downgrade(&self.inner));
			let previous = match mem::replace(&mut *state, State::Active(current.clone())) {
				State::Unset => None,
				State::Active(previous) => {
					previous.detach();
					Some(previous)
				},
			};

			(current, previous)
		};

		let event = ReinitEvent {
			current: current.clone(),
			is_initial: previous.is_none(),
			previous,
		};
		inner.emit_reinit(&event);

		current
	}

	/// Adds a subscriber.
	///
	/// `on_change` is called for every write matching `dependencies`, and `on_reinit`
	/// every time the value is replaced.
	#[track_caller]
	pub fn subscribe<C, R>(&self, on_change: C, on_reinit: R, dependencies: impl Into<Dependencies>) -> SubscriberId
	where
		C: Fn(&ChangeEvent) + SyncBounds + 'static,
		R: Fn(&ReinitEvent) + SyncBounds + 'static,
	{
		self.inner.registry.subscribe(dependencies.into(), on_change, on_reinit)
	}

	/// Removes a subscriber.
	///
	/// Removing a subscriber that doesn't exist does nothing.
	pub fn unsubscribe(&self, id: SubscriberId) {
		_ = self.inner.registry.unsubscribe(id);
	}

	/// Adds a subscriber that's removed once the returned subscription is dropped
	#[track_caller]
	pub fn watch<C, R>(&self, on_change: C, on_reinit: R, dependencies: impl Into<Dependencies>) -> Subscription
	where
		C: Fn(&ChangeEvent) + SyncBounds + 'static,
		R: Fn(&ReinitEvent) + SyncBounds + 'static,
	{
		let id = self.subscribe(on_change, on_reinit, dependencies);
		Subscription {
			id,
			store: Some(self.downgrade()),
		}
	}

	/// Returns the number of subscribers
	#[must_use]
	pub fn subscriber_count(&self) -> usize {
		self.inner.registry.len()
	}

	/// Removes all subscribers
	pub fn dispose(&self) {
		tracing::trace!(name = ?self.inner.name, subscribers = self.inner.registry.len(), "Disposing store");
		self.inner.registry.clear();
	}

	/// Downgrades this store
	#[must_use]
	pub fn downgrade(&self) -> WeakStore {
		WeakStore {
			inner: Rc::downgrade(&self.inner),
		}
	}

	/// Returns if `self` and `other` are the same store
	#[must_use]
	pub fn is(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Clone for Store {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl fmt::Debug for Store {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("Store");
		s.field("name", &self.inner.name);
		match self.inner.current.imut_try_read() {
			Some(state) => match &*state {
				State::Unset => s.field("current", &format_args!("<unset>")),
				State::Active(current) => s.field("current", current),
			},
			None => s.field("current", &format_args!("<locked>")),
		};

		s.field("subscribers", &self.inner.registry.len()).finish()
	}
}

/// Weak store
pub struct WeakStore {
	/// Inner
	inner: Weak<Inner>,
}

impl WeakStore {
	/// Upgrades this store
	#[must_use]
	pub fn upgrade(&self) -> Option<Store> {
		let inner = self.inner.upgrade()?;
		Some(Store { inner })
	}
}

impl Clone for WeakStore {
	fn clone(&self) -> Self {
		Self {
			inner: Weak::clone(&self.inner),
		}
	}
}

impl fmt::Debug for WeakStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.upgrade() {
			Some(store) => f.debug_tuple("WeakStore").field(&store).finish(),
			None => f.pad("WeakStore(<dropped>)"),
		}
	}
}

/// Subscription.
///
/// Unsubscribes once dropped.
#[must_use = "Dropping a subscription unsubscribes it"]
#[derive(Debug)]
pub struct Subscription {
	/// Subscriber id
	id: SubscriberId,

	/// Store
	store: Option<WeakStore>,
}

impl Subscription {
	/// Returns the subscriber id
	#[must_use]
	pub const fn id(&self) -> SubscriberId {
		self.id
	}

	/// Forgets this subscription, keeping the subscriber alive.
	///
	/// It may still be removed with [`Store::unsubscribe`].
	pub fn forget(mut self) -> SubscriberId {
		self.store = None;
		self.id
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(store) = self.store.take().and_then(|store| store.upgrade()) {
			store.unsubscribe(self.id);
		}
	}
}
