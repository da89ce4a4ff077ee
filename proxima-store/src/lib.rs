//! Observable store.
//!
//! A [`Store`] holds a single value and notifies it's subscribers whenever
//! the value is replaced (a "reinit"), or one of it's fields is written
//! (a "change").
//!
//! Subscribers declare which writes they care about through [`Dependencies`],
//! either specific fields, paths within fields, or arbitrary predicates.
//!
//! ```
//! use proxima_store::{Dependencies, Store};
//! use proxima_value::{FieldAccess, Key, Object, Value};
//!
//! let store = Store::new(Object::from_iter([("a", 1), ("b", 2)])).expect("Unable to create store");
//! store.subscribe(
//! 	|event| println!("{} changed from {:?} to {:?}", event.property, event.previous, event.current),
//! 	|_| (),
//! 	Dependencies::from(["a"]),
//! );
//!
//! store.get().set(Key::new("a"), Value::from(2));
//! ```

// Modules
mod dependency;
mod dispatch;
mod error;
mod event;
mod intercept;
mod loc;
mod registry;
mod store;

// Exports
pub use self::{
	dependency::{Dependencies, Dependency, Predicate, PredicateFn},
	error::StoreError,
	event::{ChangeEvent, ReinitEvent},
	intercept::{Interception, LiveView, Tracked},
	loc::Loc,
	registry::{ChangeFn, Registry, ReinitFn, Subscriber, SubscriberId},
	store::{Store, StoreBuilder, Subscription, WeakStore},
};

// Imports
use proxima_value::Value;

/// Creates a new store with `initial` as it's value
pub fn create_store(initial: impl Into<Value>) -> Result<Store, StoreError> {
	Store::new(initial)
}
