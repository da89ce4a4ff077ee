//! Property key

// Imports
use {core::borrow::Borrow, proxima_sync_types::Rc};

/// Property key.
///
/// Cloning a key is cheap.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
#[derive(derive_more::Display, derive_more::Debug)]
#[display("{_0}")]
#[debug("{_0:?}")]
pub struct Key(Rc<str>);

impl Key {
	/// Creates a new key
	#[must_use]
	pub fn new(key: &str) -> Self {
		Self(Rc::from(key))
	}

	/// Returns this key as a string
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

#[duplicate::duplicate_item(
	T;
	[ &'_ str ];
	[ String ];
	[ &'_ String ];
)]
impl From<T> for Key {
	fn from(key: T) -> Self {
		let key: &str = key.as_ref();
		Self::new(key)
	}
}

impl From<&'_ Self> for Key {
	fn from(key: &'_ Self) -> Self {
		key.clone()
	}
}

impl Borrow<str> for Key {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl PartialEq<str> for Key {
	fn eq(&self, other: &str) -> bool {
		*self.0 == *other
	}
}

impl PartialEq<&'_ str> for Key {
	fn eq(&self, other: &&'_ str) -> bool {
		*self.0 == **other
	}
}
