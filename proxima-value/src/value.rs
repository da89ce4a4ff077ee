//! Value
//!
//! A dynamically typed value, as stored in object fields and observed by stores.
//!
//! Equality between values is *identity*: primitives are identical when they hold
//! the same value, while objects and functions are identical only when they are
//! the same allocation. Two objects with the same fields are never identical.

// Imports
use {
	crate::{Function, Key, Object},
	core::fmt,
	proxima_sync_types::Rc,
};

/// Value
#[derive(Clone, Default)]
pub enum Value {
	/// Absent value.
	///
	/// Returned when reading missing fields, or fields of non-objects.
	#[default]
	Undefined,

	/// Null
	Null,

	/// Boolean
	Bool(bool),

	/// Number
	Number(f64),

	/// String
	String(Rc<str>),

	/// Object
	Object(Object),

	/// Function
	Function(Function),
}

impl Value {
	/// Returns if `self` and `other` are the same value.
	///
	/// Primitives are compared by value, objects and functions by identity.
	#[must_use]
	pub fn is(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
			(Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
			(Self::Number(lhs), Self::Number(rhs)) => lhs == rhs,
			(Self::String(lhs), Self::String(rhs)) => lhs == rhs,
			(Self::Object(lhs), Self::Object(rhs)) => lhs.is(rhs),
			(Self::Function(lhs), Self::Function(rhs)) => lhs.is(rhs),
			_ => false,
		}
	}

	/// Returns if this value is `Undefined` or `Null`
	#[must_use]
	pub const fn is_nullish(&self) -> bool {
		matches!(self, Self::Undefined | Self::Null)
	}

	/// Returns if this value is `Undefined`
	#[must_use]
	pub const fn is_undefined(&self) -> bool {
		matches!(self, Self::Undefined)
	}

	/// Returns this value as a boolean
	#[must_use]
	pub const fn as_bool(&self) -> Option<bool> {
		match *self {
			Self::Bool(value) => Some(value),
			_ => None,
		}
	}

	/// Returns this value as a number
	#[must_use]
	pub const fn as_number(&self) -> Option<f64> {
		match *self {
			Self::Number(value) => Some(value),
			_ => None,
		}
	}

	/// Returns this value as a string
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value),
			_ => None,
		}
	}

	/// Returns this value as an object
	#[must_use]
	pub const fn as_object(&self) -> Option<&Object> {
		match self {
			Self::Object(object) => Some(object),
			_ => None,
		}
	}

	/// Returns this value as a function
	#[must_use]
	pub const fn as_function(&self) -> Option<&Function> {
		match self {
			Self::Function(function) => Some(function),
			_ => None,
		}
	}

	/// Reads field `key` of this value.
	///
	/// Non-objects don't have any fields, so this returns `Undefined` for them.
	#[must_use]
	pub fn get(&self, key: &Key) -> Self {
		match self {
			Self::Object(object) => object.get(key),
			_ => Self::Undefined,
		}
	}

	/// Walks `path` starting from this value.
	///
	/// A missing field along the way resolves to `Undefined`, and any further
	/// steps from it stay `Undefined`.
	#[must_use]
	pub fn walk<'a, I>(&self, path: I) -> Self
	where
		I: IntoIterator<Item = &'a Key>,
	{
		path.into_iter().fold(self.clone(), |value, key| value.get(key))
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.is(other)
	}
}

impl From<()> for Value {
	fn from((): ()) -> Self {
		Self::Undefined
	}
}

#[duplicate::duplicate_item(
	T          body;
	[ bool ]   [ Self::Bool(value) ];
	[ f64 ]    [ Self::Number(value) ];
	[ f32 ]    [ Self::Number(f64::from(value)) ];
	[ i32 ]    [ Self::Number(f64::from(value)) ];
	[ u32 ]    [ Self::Number(f64::from(value)) ];
	[ &'_ str ] [ Self::String(Rc::from(value)) ];
	[ String ] [ Self::String(Rc::from(value)) ];
	[ Object ] [ Self::Object(value) ];
	[ Function ] [ Self::Function(value) ];
)]
impl From<T> for Value {
	fn from(value: T) -> Self {
		body
	}
}

impl<T> From<Option<T>> for Value
where
	T: Into<Self>,
{
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, T::into)
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undefined => f.pad("undefined"),
			Self::Null => f.pad("null"),
			Self::Bool(value) => fmt::Debug::fmt(value, f),
			Self::Number(value) => fmt::Display::fmt(value, f),
			Self::String(value) => fmt::Debug::fmt(&**value, f),
			Self::Object(object) => fmt::Debug::fmt(object, f),
			Self::Function(function) => fmt::Debug::fmt(function, f),
		}
	}
}
