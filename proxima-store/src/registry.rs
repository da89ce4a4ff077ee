//! Subscription registry

// Imports
use {
	crate::{ChangeEvent, Dependencies, ReinitEvent, loc::Loc},
	core::fmt,
	proxima_sync_types::{IMut, IMutExt, Rc, SyncBounds},
	uuid::Uuid,
};

/// Change callback
pub type ChangeFn = proxima_sync_types::dyn_sync!(Fn(&ChangeEvent));

/// Reinit callback
pub type ReinitFn = proxima_sync_types::dyn_sync!(Fn(&ReinitEvent));

/// Subscriber id
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[derive(derive_more::Display, derive_more::Debug)]
#[display("{_0}")]
#[debug("{_0}")]
pub struct SubscriberId(Uuid);

impl SubscriberId {
	/// Creates a new, unique, id
	#[must_use]
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for SubscriberId {
	fn default() -> Self {
		Self::new()
	}
}

/// Subscriber
pub struct Subscriber {
	/// Id
	id: SubscriberId,

	/// Dependencies
	dependencies: Dependencies,

	/// Change callback
	on_change: Rc<ChangeFn>,

	/// Reinit callback
	on_reinit: Rc<ReinitFn>,

	/// Where this subscriber was defined
	defined_loc: Loc,
}

impl Subscriber {
	/// Returns this subscriber's id
	#[must_use]
	pub const fn id(&self) -> SubscriberId {
		self.id
	}

	/// Returns this subscriber's dependencies
	#[must_use]
	pub const fn dependencies(&self) -> &Dependencies {
		&self.dependencies
	}

	/// Returns where this subscriber was defined
	#[must_use]
	pub const fn defined_loc(&self) -> Loc {
		self.defined_loc
	}

	/// Calls the change callback
	pub fn change(&self, event: &ChangeEvent) {
		(self.on_change)(event);
	}

	/// Calls the reinit callback
	pub fn reinit(&self, event: &ReinitEvent) {
		(self.on_reinit)(event);
	}
}

impl fmt::Display for Subscriber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "subscriber {} ({})", self.id, self.defined_loc)
	}
}

impl fmt::Debug for Subscriber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscriber")
			.field("id", &self.id)
			.field("dependencies", &self.dependencies)
			.field("defined_loc", &self.defined_loc)
			.finish_non_exhaustive()
	}
}

/// Subscription registry.
///
/// Keeps subscribers in the order they subscribed.
#[derive(Default)]
pub struct Registry {
	/// Subscribers
	subscribers: IMut<Vec<Rc<Subscriber>>>,
}

impl Registry {
	/// Creates a new, empty, registry
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a subscriber and returns it's id
	#[track_caller]
	pub fn subscribe<C, R>(&self, dependencies: Dependencies, on_change: C, on_reinit: R) -> SubscriberId
	where
		C: Fn(&ChangeEvent) + SyncBounds + 'static,
		R: Fn(&ReinitEvent) + SyncBounds + 'static,
	{
		let subscriber = Subscriber {
			id: SubscriberId::new(),
			dependencies,
			on_change: Rc::new(on_change),
			on_reinit: Rc::new(on_reinit),
			defined_loc: Loc::caller(),
		};
		let id = subscriber.id;
		tracing::trace!(%id, dependencies = ?subscriber.dependencies, loc = %subscriber.defined_loc, "Adding subscriber");

		self.subscribers.imut_write().push(Rc::new(subscriber));
		id
	}

	/// Removes a subscriber.
	///
	/// Returns if the subscriber existed.
	pub fn unsubscribe(&self, id: SubscriberId) -> bool {
		// Note: The subscriber must only be dropped once the lock is released, since
		//       it's callbacks may own subscriptions that unsubscribe from us.
		let subscriber = {
			let mut subscribers = self.subscribers.imut_write();
			let idx = subscribers.iter().position(|subscriber| subscriber.id == id);
			idx.map(|idx| subscribers.remove(idx))
		};

		match subscriber {
			Some(subscriber) => {
				tracing::trace!(%id, loc = %subscriber.defined_loc, "Removed subscriber");
				true
			},
			None => {
				tracing::trace!(%id, "Subscriber was already removed");
				false
			},
		}
	}

	/// Returns if subscriber `id` exists
	#[must_use]
	pub fn contains(&self, id: SubscriberId) -> bool {
		self.subscribers.imut_read().iter().any(|subscriber| subscriber.id == id)
	}

	/// Returns all current subscribers.
	///
	/// Subscribing or unsubscribing afterwards doesn't affect the returned list.
	#[must_use]
	pub fn snapshot(&self) -> Vec<Rc<Subscriber>> {
		self.subscribers.imut_read().clone()
	}

	/// Returns the number of subscribers
	#[must_use]
	pub fn len(&self) -> usize {
		self.subscribers.imut_read().len()
	}

	/// Returns if there are no subscribers
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.subscribers.imut_read().is_empty()
	}

	/// Removes all subscribers
	pub fn clear(&self) {
		let subscribers = core::mem::take(&mut *self.subscribers.imut_write());
		tracing::trace!(len = subscribers.len(), "Removed all subscribers");
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.subscribers.imut_try_read() {
			Some(subscribers) => f.debug_list().entries(subscribers.iter()).finish(),
			None => f.pad("<locked>"),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn subscribe(registry: &Registry) -> SubscriberId {
		registry.subscribe(Dependencies::All, |_| (), |_| ())
	}

	#[test]
	fn insertion_order() {
		let registry = Registry::new();
		let ids = [subscribe(&registry), subscribe(&registry), subscribe(&registry)];

		let snapshot = registry.snapshot().iter().map(|subscriber| subscriber.id()).collect::<Vec<_>>();
		assert_eq!(snapshot, ids);
	}

	#[test]
	fn unique_ids() {
		let registry = Registry::new();
		let id1 = subscribe(&registry);
		let id2 = subscribe(&registry);
		assert_ne!(id1, id2);
	}

	#[test]
	fn unsubscribe_idempotent() {
		let registry = Registry::new();
		let id = subscribe(&registry);
		let other = subscribe(&registry);

		assert!(registry.unsubscribe(id));
		assert!(!registry.unsubscribe(id));
		assert!(!registry.contains(id));
		assert!(registry.contains(other));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn unsubscribe_unknown() {
		let registry = Registry::new();
		_ = subscribe(&registry);
		assert!(!registry.unsubscribe(SubscriberId::new()));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn snapshot_detached() {
		let registry = Registry::new();
		let id = subscribe(&registry);

		let snapshot = registry.snapshot();
		_ = subscribe(&registry);
		_ = registry.unsubscribe(id);

		assert_eq!(snapshot.len(), 1);
		assert_eq!(snapshot[0].id(), id);
	}

	#[test]
	fn clear() {
		let registry = Registry::new();
		_ = subscribe(&registry);
		_ = subscribe(&registry);

		registry.clear();
		assert!(registry.is_empty());
	}
}
