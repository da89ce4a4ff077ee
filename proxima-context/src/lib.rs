//! Store contexts for `proxima`.
//!
//! A [`StoreContext`] lets code deep within a call tree reach a store
//! provided further up, without having to pass it around.
//!
//! Providers are stacked per-thread: the innermost provider of a context
//! shadows any outer ones until it's handle is dropped.

// Imports
use {
	core::{fmt, marker::PhantomData},
	proxima_store::{ChangeEvent, Dependencies, ReinitEvent, Store, Subscription},
	proxima_sync_types::SyncBounds,
	std::{
		cell::RefCell,
		collections::HashMap,
		hash::{BuildHasher, DefaultHasher},
	},
	uuid::Uuid,
};

type CtxsStack = RefCell<HashMap<ContextId, CtxStack, RandomState>>;
type CtxStack = Vec<Option<Store>>;

/// Hash builder for `CTXS_STACK`
struct RandomState;

impl BuildHasher for RandomState {
	type Hasher = DefaultHasher;

	fn build_hasher(&self) -> Self::Hasher {
		DefaultHasher::default()
	}
}

// Note: Stores may be `!Send`, so each thread gets it's own stacks.
thread_local! {
	/// Context stacks
	static CTXS_STACK: CtxsStack = const { RefCell::new(HashMap::with_hasher(RandomState)) };
}

/// Uses the stack of context `id`
fn with_ctx_stack<F, O>(id: ContextId, f: F) -> O
where
	F: FnOnce(Option<&CtxStack>) -> O,
{
	CTXS_STACK.with(|ctxs| {
		let ctxs = ctxs.try_borrow().expect("Cannot access context while modifying it");
		f(ctxs.get(&id))
	})
}

/// Uses the stack of context `id` mutably
fn with_ctx_stack_mut<F, O>(id: ContextId, f: F) -> O
where
	F: FnOnce(&mut CtxStack) -> O,
{
	CTXS_STACK.with(|ctxs| {
		let mut ctxs = ctxs.try_borrow_mut().expect("Cannot modify context while accessing it");
		let stack = ctxs.entry(id).or_default();
		let output = f(stack);
		if stack.is_empty() {
			_ = ctxs.remove(&id);
		}

		output
	})
}

/// Context error
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(thiserror::Error)]
pub enum ContextError {
	/// No store was provided for the context
	#[error("No {name} provider found.")]
	MissingProvider {
		/// Context name
		name: String,
	},
}

/// Context id
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
struct ContextId(Uuid);

/// Store context
#[derive(Clone)]
pub struct StoreContext {
	/// Id
	id: ContextId,

	/// Name
	name: String,
}

impl StoreContext {
	/// Creates a new context
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id:   ContextId(Uuid::new_v4()),
			name: name.into(),
		}
	}

	/// Returns the name of this context
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Provides `store` to this context.
	///
	/// Once the handle is dropped, the store is removed from the context
	/// and disposed of.
	pub fn provide(&self, store: Store) -> Handle {
		self::with_ctx_stack_mut(self.id, |stack| {
			let value_idx = stack.len();
			stack.push(Some(store));
			tracing::trace!(name = %self.name, value_idx, "Provided store");

			Handle {
				context: self.id,
				value_idx,
				_phantom: PhantomData,
			}
		})
	}

	/// Gets the innermost store provided to this context
	#[must_use]
	pub fn get(&self) -> Option<Store> {
		self::with_ctx_stack(self.id, |stack| {
			stack?
				.iter()
				.rev()
				.find_map(|store| store.as_ref())
				.map(Store::clone)
		})
	}

	/// Gets the innermost store provided to this context, erroring if there isn't any
	pub fn store(&self) -> Result<Store, ContextError> {
		self.get().ok_or_else(|| ContextError::MissingProvider {
			name: self.name.clone(),
		})
	}

	/// Subscribes to the innermost store of this context.
	///
	/// The subscriber is removed once the subscription is dropped.
	#[track_caller]
	pub fn subscribe<C, R>(
		&self,
		on_change: C,
		on_reinit: R,
		dependencies: impl Into<Dependencies>,
	) -> Result<Subscription, ContextError>
	where
		C: Fn(&ChangeEvent) + SyncBounds + 'static,
		R: Fn(&ReinitEvent) + SyncBounds + 'static,
	{
		let store = self.store()?;
		Ok(store.watch(on_change, on_reinit, dependencies))
	}
}

impl fmt::Debug for StoreContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StoreContext").field("name", &self.name).finish_non_exhaustive()
	}
}

/// A handle to a provided store.
///
/// When dropped, the store is removed from the context and disposed.
#[must_use = "The handle keeps the store in context. If dropped, the store is also removed"]
pub struct Handle {
	/// Context
	context: ContextId,

	/// Index
	value_idx: usize,

	/// Handles are tied to the thread they were created on
	_phantom: PhantomData<*const ()>,
}

impl Handle {
	/// Returns the store this handle is providing
	#[must_use]
	pub fn store(&self) -> Store {
		self::with_ctx_stack(self.context, |stack| {
			stack
				.expect("Context stack should exist")
				.get(self.value_idx)
				.expect("Value was already taken")
				.as_ref()
				.expect("Value was already taken")
				.clone()
		})
	}

	/// Takes the store out of the context, without disposing it.
	#[must_use = "If you only wish to remove the store, consider dropping the handle"]
	pub fn take(self) -> Store {
		let store = self.take_inner();
		core::mem::forget(self);

		store
	}

	/// Inner method for [`take`](Self::take), and the [`Drop`] impl.
	fn take_inner(&self) -> Store {
		self::with_ctx_stack_mut(self.context, |stack| {
			let store = stack
				.get_mut(self.value_idx)
				.and_then(Option::take)
				.expect("Value was already taken");

			// Then remove any empty entries from the end
			while stack.last().is_some_and(Option::is_none) {
				stack.pop().expect("Should have a value at the end");
			}

			store
		})
	}
}

impl Drop for Handle {
	fn drop(&mut self) {
		let store = self.take_inner();
		store.dispose();
	}
}

impl fmt::Debug for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handle").field("value_idx", &self.value_idx).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod test {
	use {
		super::*,
		proxima_store::Dependency,
		proxima_value::{FieldAccess, Key, Object, Value},
		std::sync::{
			Arc,
			atomic::{self, AtomicUsize},
		},
	};

	fn store(value: i32) -> Store {
		Store::new(Object::from_iter([("value", value)])).expect("Unable to create store")
	}

	fn value(store: &Store) -> Value {
		store.get().get(&Key::new("value"))
	}

	#[test]
	fn simple() {
		let ctx = StoreContext::new("Simple");
		let handle = ctx.provide(self::store(5));

		assert_eq!(ctx.get().as_ref().map(self::value), Some(Value::from(5)));
		assert_eq!(self::value(&handle.take()), Value::from(5));
		assert!(ctx.get().is_none());
	}

	#[test]
	fn stacked() {
		let ctx = StoreContext::new("Stacked");
		let handle1 = ctx.provide(self::store(5));
		let handle2 = ctx.provide(self::store(4));

		assert_eq!(ctx.get().as_ref().map(self::value), Some(Value::from(4)));
		assert_eq!(self::value(&handle2.take()), Value::from(4));
		assert_eq!(ctx.get().as_ref().map(self::value), Some(Value::from(5)));
		assert_eq!(self::value(&handle1.take()), Value::from(5));
		assert!(ctx.get().is_none());
	}

	#[test]
	fn stacked_swapped() {
		let ctx = StoreContext::new("Swapped");
		let handle1 = ctx.provide(self::store(5));
		let handle2 = ctx.provide(self::store(4));

		assert_eq!(ctx.get().as_ref().map(self::value), Some(Value::from(4)));
		assert_eq!(self::value(&handle1.take()), Value::from(5));
		assert_eq!(ctx.get().as_ref().map(self::value), Some(Value::from(4)));
		assert_eq!(self::value(&handle2.take()), Value::from(4));
		assert!(ctx.get().is_none());
	}

	#[test]
	fn independent_contexts() {
		let ctx1 = StoreContext::new("First");
		let ctx2 = StoreContext::new("Second");
		let _handle = ctx1.provide(self::store(1));

		assert!(ctx1.get().is_some());
		assert!(ctx2.get().is_none());
	}

	#[test]
	fn missing_provider() {
		let ctx = StoreContext::new("Settings");

		let err = ctx.store().expect_err("Should be missing a provider");
		assert_eq!(err, ContextError::MissingProvider {
			name: "Settings".to_owned(),
		});
		assert_eq!(err.to_string(), "No Settings provider found.");

		let err = ctx
			.subscribe(|_| (), |_| (), Dependencies::All)
			.expect_err("Should be missing a provider");
		assert_eq!(err.to_string(), "No Settings provider found.");
	}

	#[test]
	fn subscribe() {
		let ctx = StoreContext::new("Subscribe");
		let handle = ctx.provide(self::store(0));

		let changes = Arc::new(AtomicUsize::new(0));
		let subscription = ctx
			.subscribe(
				{
					let changes = Arc::clone(&changes);
					move |_| {
						changes.fetch_add(1, atomic::Ordering::Relaxed);
					}
				},
				|_| (),
				[Dependency::from("value")],
			)
			.expect("Should have a provider");

		handle.store().get().set(Key::new("value"), Value::from(1));
		assert_eq!(changes.load(atomic::Ordering::Relaxed), 1);

		drop(subscription);
		handle.store().get().set(Key::new("value"), Value::from(2));
		assert_eq!(changes.load(atomic::Ordering::Relaxed), 1, "Dropped subscription was notified");
	}

	#[test]
	fn drop_disposes() {
		let ctx = StoreContext::new("Dispose");
		let handle = ctx.provide(self::store(0));
		let store = handle.store();

		_ = store.subscribe(|_| (), |_| (), Dependencies::All);
		assert_eq!(store.subscriber_count(), 1);

		drop(handle);
		assert_eq!(store.subscriber_count(), 0);
		assert!(ctx.get().is_none());
	}
}
