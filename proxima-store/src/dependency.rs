//! Dependencies
//!
//! A subscriber declares which writes it's interested in through a list of
//! [`Dependency`]s. A write is matched against each of them, and the
//! subscriber is notified if *any* of them match.

// Imports
use {
	crate::{ChangeEvent, Tracked},
	core::fmt,
	itertools::Itertools,
	proxima_sync_types::{Rc, SyncBounds},
	proxima_value::{Key, Value},
};

/// Predicate function.
///
/// Receives the written property, it's current and previous values,
/// and the store's whole value.
pub type PredicateFn = proxima_sync_types::dyn_sync!(Fn(&Key, &Value, &Value, &Tracked) -> bool);

/// Predicate dependency
pub struct Predicate {
	/// Inner
	inner: Rc<PredicateFn>,
}

impl Predicate {
	/// Creates a new predicate
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&Key, &Value, &Value, &Tracked) -> bool + SyncBounds + 'static,
	{
		Self { inner: Rc::new(f) }
	}

	/// Calls this predicate
	#[must_use]
	pub fn call(&self, property: &Key, current: &Value, previous: &Value, whole: &Tracked) -> bool {
		(self.inner)(property, current, previous, whole)
	}
}

impl Clone for Predicate {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

/// Dependency
#[derive(Clone)]
pub enum Dependency {
	/// Matches writes to a property that changed it's value
	Key(Key),

	/// Matches writes to property `first` that changed the
	/// value reached by walking `rest` from it.
	Path {
		/// Written property
		first: Key,

		/// Path within the property
		rest: Vec<Key>,
	},

	/// Matches whatever the predicate returns, even if the value didn't change
	Predicate(Predicate),

	/// Never matches
	Disabled,
}

impl Dependency {
	/// Creates a key dependency
	pub fn key<K: Into<Key>>(key: K) -> Self {
		Self::Key(key.into())
	}

	/// Creates a path dependency.
	///
	/// A single-element path is the same as a key dependency, and
	/// an empty path never matches anything.
	pub fn path<I>(path: I) -> Self
	where
		I: IntoIterator<Item: Into<Key>>,
	{
		let mut path = path.into_iter().map(Into::into);
		let Some(first) = path.next() else {
			tracing::warn!("Empty dependency path, it will never match");
			return Self::Disabled;
		};

		let rest = path.collect::<Vec<_>>();
		match rest.is_empty() {
			true => Self::Key(first),
			false => Self::Path { first, rest },
		}
	}

	/// Creates a predicate dependency
	pub fn predicate<F>(f: F) -> Self
	where
		F: Fn(&Key, &Value, &Value, &Tracked) -> bool + SyncBounds + 'static,
	{
		Self::Predicate(Predicate::new(f))
	}

	/// Returns if this dependency matches a write.
	///
	/// `whole` is the store's current value, given to predicates.
	#[must_use]
	pub fn matches(&self, event: &ChangeEvent, whole: &Tracked) -> bool {
		match self {
			Self::Key(key) => event.property == *key && event.is_changed(),
			Self::Path { first, rest } =>
				event.property == *first && !event.current.walk(rest).is(&event.previous.walk(rest)),
			Self::Predicate(predicate) => predicate.call(&event.property, &event.current, &event.previous, whole),
			Self::Disabled => false,
		}
	}
}

impl From<Key> for Dependency {
	fn from(key: Key) -> Self {
		Self::Key(key)
	}
}

#[duplicate::duplicate_item(
	T;
	[ &'_ str ];
	[ String ];
)]
impl From<T> for Dependency {
	fn from(key: T) -> Self {
		Self::Key(Key::from(key))
	}
}

impl<K: Into<Key>, const N: usize> From<[K; N]> for Dependency {
	fn from(path: [K; N]) -> Self {
		Self::path(path)
	}
}

impl<K: Into<Key>> From<Vec<K>> for Dependency {
	fn from(path: Vec<K>) -> Self {
		Self::path(path)
	}
}

impl From<Predicate> for Dependency {
	fn from(predicate: Predicate) -> Self {
		Self::Predicate(predicate)
	}
}

impl<D: Into<Self>> From<Option<D>> for Dependency {
	fn from(dep: Option<D>) -> Self {
		dep.map_or(Self::Disabled, D::into)
	}
}

impl fmt::Debug for Dependency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Key(key) => write!(f, "{key}"),
			Self::Path { first, rest } => write!(f, "{first}.{}", rest.iter().join(".")),
			Self::Predicate(_) => f.pad("<predicate>"),
			Self::Disabled => f.pad("<disabled>"),
		}
	}
}

/// Dependencies of a subscriber
#[derive(Clone, Default, Debug)]
pub enum Dependencies {
	/// Matches every write
	#[default]
	All,

	/// Matches a write if any of the dependencies match it.
	///
	/// An empty list matches every write.
	AnyOf(Vec<Dependency>),
}

impl Dependencies {
	/// Returns if these dependencies match a write
	#[must_use]
	pub fn matches(&self, event: &ChangeEvent, whole: &Tracked) -> bool {
		match self {
			Self::All => true,
			Self::AnyOf(deps) => deps.is_empty() || deps.iter().any(|dep| dep.matches(event, whole)),
		}
	}
}

impl<D: Into<Dependency>> From<Vec<D>> for Dependencies {
	fn from(deps: Vec<D>) -> Self {
		Self::AnyOf(deps.into_iter().map(D::into).collect())
	}
}

impl<D: Into<Dependency>, const N: usize> From<[D; N]> for Dependencies {
	fn from(deps: [D; N]) -> Self {
		Self::AnyOf(deps.into_iter().map(D::into).collect())
	}
}

impl<D: Into<Self>> From<Option<D>> for Dependencies {
	fn from(deps: Option<D>) -> Self {
		deps.map_or(Self::All, D::into)
	}
}
