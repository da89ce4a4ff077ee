//! Events

// Imports
use {
	crate::Tracked,
	proxima_value::{Key, Value},
};

/// A field of the store's value was written
#[derive(Clone, Debug)]
pub struct ChangeEvent {
	/// Written field
	pub property: Key,

	/// Value after the write
	pub current: Value,

	/// Value before the write
	pub previous: Value,
}

impl ChangeEvent {
	/// Returns if the written field actually changed
	#[must_use]
	pub fn is_changed(&self) -> bool {
		!self.current.is(&self.previous)
	}
}

/// The store's value was replaced
#[derive(Clone, Debug)]
pub struct ReinitEvent {
	/// New value
	pub current: Tracked,

	/// Previous value.
	///
	/// Only `None` for the initial value.
	pub previous: Option<Tracked>,

	/// Whether this is the store's initial value
	pub is_initial: bool,
}
