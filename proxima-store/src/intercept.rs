//! Mutation interception
//!
//! A store never hands out it's object directly. Instead, it wraps it in a
//! [`LiveView`], an interception layer that forwards reads to the object and
//! traps every write, so the store can notify it's subscribers.
//!
//! Each layer is bound to a single object. When the store's value is
//! replaced, the old layer is detached: writes through it still reach the
//! object, but no longer notify anyone.

// Imports
use {
	crate::store,
	core::{
		fmt,
		sync::atomic::{self, AtomicBool},
	},
	proxima_sync_types::{Rc, Weak},
	proxima_value::{FieldAccess, Function, Key, Object, Value},
};

/// Interception primitive.
///
/// Describes how field writes on the store's value can be trapped.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Interception {
	/// Field writes are trapped through a [`LiveView`]
	Trap,

	/// Field writes can't be trapped
	Unavailable,
}

impl Interception {
	/// Detects the interception primitive of this environment
	#[must_use]
	pub const fn detect() -> Self {
		match cfg!(feature = "trap") {
			true => Self::Trap,
			false => Self::Unavailable,
		}
	}

	/// Returns if field writes can be trapped
	#[must_use]
	pub const fn is_available(self) -> bool {
		matches!(self, Self::Trap)
	}
}

impl Default for Interception {
	fn default() -> Self {
		Self::detect()
	}
}

/// Interception layer
struct Layer {
	/// Object we're intercepting
	target: Object,

	/// Store we notify
	store: Weak<store::Inner>,

	/// Whether we're still the store's value
	attached: AtomicBool,
}

/// Live view over the store's object.
///
/// Cloning the view yields another handle to the same layer.
pub struct LiveView {
	/// Layer
	layer: Rc<Layer>,
}

impl LiveView {
	/// Creates a new layer over `target`, notifying `store`
	pub(crate) fn new(target: Object, store: Weak<store::Inner>) -> Self {
		let layer = Layer {
			target,
			store,
			attached: AtomicBool::new(true),
		};
		Self { layer: Rc::new(layer) }
	}

	/// Returns the object behind this view.
	///
	/// Writes to the object directly are not observed.
	#[must_use]
	pub fn target(&self) -> &Object {
		&self.layer.target
	}

	/// Returns if this view is still the store's value
	#[must_use]
	pub fn is_attached(&self) -> bool {
		self.layer.attached.load(atomic::Ordering::Acquire)
	}

	/// Detaches this view from the store
	pub(crate) fn detach(&self) {
		self.layer.attached.store(false, atomic::Ordering::Release);
	}

	/// Returns if `self` and `other` are the same layer
	#[must_use]
	pub fn is(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.layer, &other.layer)
	}

	/// Reads field `key`.
	///
	/// Functions are bound to the store, so that, when called, their receiver
	/// is whatever the store's value is *at that point*, even if they were read
	/// before the store's value was replaced.
	#[must_use]
	pub fn get(&self, key: &Key) -> Value {
		match self.layer.target.get(key) {
			Value::Function(function) => Value::Function(self::bind(
				function,
				Weak::clone(&self.layer.store),
				self.layer.target.clone(),
			)),
			value => value,
		}
	}

	/// Writes field `key`.
	///
	/// The write goes through any setter of the object, and the value read back
	/// afterwards is what subscribers see as the current value. Subscribers are
	/// notified before this returns.
	pub fn set(&self, key: Key, value: Value) {
		let layer = &*self.layer;
		let store = layer.store.upgrade();
		let _exclusive = store.as_ref().map(|store| store.exclusive.enter());

		let previous = layer.target.get(&key);
		layer.target.set(key.clone(), value);
		let current = layer.target.get(&key);

		match &store {
			Some(store) if self.is_attached() => store.emit_change(key, current, previous),
			_ => tracing::trace!(%key, ?current, ?previous, "Write through a detached view, not notifying"),
		}
	}

	/// Returns all keys of the object
	#[must_use]
	pub fn keys(&self) -> Vec<Key> {
		self.layer.target.keys()
	}
}

impl Clone for LiveView {
	fn clone(&self) -> Self {
		Self {
			layer: Rc::clone(&self.layer),
		}
	}
}

impl FieldAccess for LiveView {
	fn get(&self, key: &Key) -> Value {
		Self::get(self, key)
	}

	fn set(&self, key: Key, value: Value) {
		Self::set(self, key, value);
	}
}

impl fmt::Debug for LiveView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.layer.target, f)
	}
}

/// Binds `function` to the store's current value.
///
/// If the store no longer exists, binds to `fallback` instead.
fn bind(function: Function, store: Weak<store::Inner>, fallback: Object) -> Function {
	Function::new(move |_this, args| match store.upgrade() {
		Some(store) => {
			let this = store.current();
			function.call(&this, args)
		},
		None => function.call(&fallback, args),
	})
}

/// The store's value, as seen from the outside.
///
/// Objects are wrapped in a [`LiveView`], anything else has no fields
/// to intercept and is kept as-is.
#[derive(Clone)]
pub enum Tracked {
	/// Intercepted object
	Live(LiveView),

	/// Non-object value
	Plain(Value),
}

impl Tracked {
	/// Wraps `value` for `store`
	pub(crate) fn wrap(value: Value, store: Weak<store::Inner>) -> Self {
		match value {
			Value::Object(object) => Self::Live(LiveView::new(object, store)),
			value => Self::Plain(value),
		}
	}

	/// Value of a store that was never set
	#[must_use]
	pub const fn unset() -> Self {
		Self::Plain(Value::Undefined)
	}

	/// Returns the underlying value
	#[must_use]
	pub fn value(&self) -> Value {
		match self {
			Self::Live(view) => Value::Object(view.target().clone()),
			Self::Plain(value) => value.clone(),
		}
	}

	/// Returns if the underlying value is `value`
	#[must_use]
	pub fn is(&self, value: &Value) -> bool {
		match (self, value) {
			(Self::Live(view), Value::Object(object)) => view.target().is(object),
			(Self::Live(_), _) => false,
			(Self::Plain(plain), _) => plain.is(value),
		}
	}

	/// Returns the live view, if this is an object
	#[must_use]
	pub const fn as_live(&self) -> Option<&LiveView> {
		match self {
			Self::Live(view) => Some(view),
			Self::Plain(_) => None,
		}
	}

	/// Detaches this value from the store, if it's live
	pub(crate) fn detach(&self) {
		if let Self::Live(view) = self {
			view.detach();
		}
	}
}

impl FieldAccess for Tracked {
	fn get(&self, key: &Key) -> Value {
		match self {
			Self::Live(view) => view.get(key),
			Self::Plain(value) => value.get(key),
		}
	}

	fn set(&self, key: Key, value: Value) {
		match self {
			Self::Live(view) => view.set(key, value),
			Self::Plain(plain) => FieldAccess::set(plain, key, value),
		}
	}
}

impl PartialEq for Tracked {
	fn eq(&self, other: &Self) -> bool {
		self.is(&other.value())
	}
}

impl PartialEq<Value> for Tracked {
	fn eq(&self, other: &Value) -> bool {
		self.is(other)
	}
}

impl From<Tracked> for Value {
	fn from(tracked: Tracked) -> Self {
		match tracked {
			Tracked::Live(view) => Self::Object(view.target().clone()),
			Tracked::Plain(value) => value,
		}
	}
}

impl From<LiveView> for Value {
	fn from(view: LiveView) -> Self {
		Self::Object(view.target().clone())
	}
}

impl fmt::Debug for Tracked {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Live(view) => fmt::Debug::fmt(view, f),
			Self::Plain(value) => fmt::Debug::fmt(value, f),
		}
	}
}
