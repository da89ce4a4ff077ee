//! Object
//!
//! A shared, mutable collection of fields.
//!
//! Cloning an [`Object`] yields another handle to the *same* object, so
//! writes through one handle are visible through every other.

// Imports
use {
	crate::{Key, Value},
	core::{cell::Cell, fmt},
	itertools::Itertools,
	proxima_sync_types::{IMut, IMutExt, Rc, SyncBounds},
};

/// Setter function.
///
/// Receives the fields of the object and the value being written,
/// and decides what to actually store.
pub type SetterFn = proxima_sync_types::dyn_sync!(Fn(&mut Fields, Value));

/// Object fields, in insertion order
#[derive(Clone, Default)]
pub struct Fields {
	/// Entries
	entries: Vec<(Key, Value)>,
}

impl Fields {
	/// Gets a field
	#[must_use]
	pub fn get(&self, key: &Key) -> Option<&Value> {
		self.entries
			.iter()
			.find_map(|(entry_key, value)| (entry_key == key).then_some(value))
	}

	/// Inserts a field, returning the previous value, if any.
	///
	/// New fields are appended, existing fields keep their position.
	pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
		match self.entries.iter_mut().find(|(entry_key, _)| *entry_key == key) {
			Some((_, entry)) => Some(core::mem::replace(entry, value)),
			None => {
				self.entries.push((key, value));
				None
			},
		}
	}

	/// Removes a field
	pub fn remove(&mut self, key: &Key) -> Option<Value> {
		let idx = self.entries.iter().position(|(entry_key, _)| entry_key == key)?;
		let (_, value) = self.entries.remove(idx);
		Some(value)
	}

	/// Returns if a field exists
	#[must_use]
	pub fn contains(&self, key: &Key) -> bool {
		self.get(key).is_some()
	}

	/// Iterates over all keys
	pub fn keys(&self) -> impl Iterator<Item = &Key> {
		self.entries.iter().map(|(key, _)| key)
	}

	/// Iterates over all fields
	pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
		self.entries.iter().map(|(key, value)| (key, value))
	}

	/// Returns the number of fields
	#[must_use]
	pub const fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns if there are no fields
	#[must_use]
	pub const fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Inner
struct Inner {
	/// Fields
	fields: Fields,

	/// Setters
	setters: Vec<(Key, Rc<SetterFn>)>,
}

/// Object
pub struct Object {
	/// Inner
	inner: Rc<IMut<Inner>>,
}

impl Object {
	/// Creates a new, empty, object
	#[must_use]
	pub fn new() -> Self {
		let inner = Inner {
			fields:  Fields::default(),
			setters: vec![],
		};
		Self {
			inner: Rc::new(IMut::new(inner)),
		}
	}

	/// Adds a setter for `key` to this object.
	#[must_use]
	pub fn with_setter<K, F>(self, key: K, setter: F) -> Self
	where
		K: Into<Key>,
		F: Fn(&mut Fields, Value) + SyncBounds + 'static,
	{
		self.define_setter(key, setter);
		self
	}

	/// Defines the setter for `key`, replacing any existing one.
	///
	/// Whenever `key` is written, the setter runs instead of storing
	/// the value directly. The setter must not access this object other
	/// than through the fields it's given.
	pub fn define_setter<K, F>(&self, key: K, setter: F)
	where
		K: Into<Key>,
		F: Fn(&mut Fields, Value) + SyncBounds + 'static,
	{
		let key = key.into();
		let setter = Rc::new(setter) as Rc<SetterFn>;

		let mut inner = self.inner.imut_write();
		match inner.setters.iter_mut().find(|(setter_key, _)| *setter_key == key) {
			Some((_, existing)) => *existing = setter,
			None => inner.setters.push((key, setter)),
		}
	}

	/// Returns a unique identifier to this object.
	///
	/// Cloning the object will retain the same id
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).addr()
	}

	/// Returns if `self` and `other` are the same object
	#[must_use]
	pub fn is(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// Reads field `key`.
	///
	/// Returns `Undefined` if the field doesn't exist
	#[must_use]
	pub fn get(&self, key: &Key) -> Value {
		self.inner.imut_read().fields.get(key).cloned().unwrap_or_default()
	}

	/// Writes field `key`, going through it's setter, if any.
	pub fn set(&self, key: Key, value: Value) {
		// Note: We clone the setter out so that we only lock once while it runs
		let setter = self
			.inner
			.imut_read()
			.setters
			.iter()
			.find_map(|(setter_key, setter)| (*setter_key == key).then(|| Rc::clone(setter)));

		// Note: The replaced value is only dropped once the lock is released, since
		//       dropping it may access this object.
		let replaced = {
			let mut inner = self.inner.imut_write();
			match setter {
				Some(setter) => {
					setter(&mut inner.fields, value);
					None
				},
				None => inner.fields.insert(key, value),
			}
		};
		drop(replaced);
	}

	/// Removes field `key`, bypassing any setters.
	pub fn remove(&self, key: &Key) -> Option<Value> {
		self.inner.imut_write().fields.remove(key)
	}

	/// Returns if field `key` exists
	#[must_use]
	pub fn contains(&self, key: &Key) -> bool {
		self.inner.imut_read().fields.contains(key)
	}

	/// Returns all keys, in insertion order
	#[must_use]
	pub fn keys(&self) -> Vec<Key> {
		self.inner.imut_read().fields.keys().cloned().collect()
	}

	/// Returns all fields, in insertion order
	#[must_use]
	pub fn entries(&self) -> Vec<(Key, Value)> {
		self.inner
			.imut_read()
			.fields
			.iter()
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect()
	}

	/// Returns the number of fields
	#[must_use]
	pub fn len(&self) -> usize {
		self.inner.imut_read().fields.len()
	}

	/// Returns if this object has no fields
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.inner.imut_read().fields.is_empty()
	}

	/// Uses all fields of this object.
	///
	/// The object must not be written to within `f`.
	pub fn with_fields<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Fields) -> O,
	{
		f(&self.inner.imut_read().fields)
	}
}

impl Default for Object {
	fn default() -> Self {
		Self::new()
	}
}

impl Clone for Object {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<K, V> FromIterator<(K, V)> for Object
where
	K: Into<Key>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let object = Self::new();
		{
			let mut inner = object.inner.imut_write();
			for (key, value) in iter {
				inner.fields.insert(key.into(), value.into());
			}
		}

		object
	}
}

impl fmt::Debug for Object {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		/// Maximum depth of nested objects we print
		const MAX_DEPTH: usize = 16;

		thread_local! {
			/// Current depth
			static DEPTH: Cell<usize> = const { Cell::new(0) };
		}

		// Note: Objects may contain themselves, so we stop at some depth.
		let depth = DEPTH.get();
		if depth >= MAX_DEPTH {
			return f.pad("{..}");
		}
		let Some(inner) = self.inner.imut_try_read() else {
			return f.pad("{<locked>}");
		};

		DEPTH.set(depth + 1);
		let res = write!(
			f,
			"{{{}}}",
			inner
				.fields
				.iter()
				.format_with(", ", |(key, value), f| f(&format_args!("{key}: {value:?}")))
		);
		DEPTH.set(depth);

		res
	}
}
