//! Field access

// Imports
use crate::{Key, Object, Value};

/// Types whose fields may be read and written.
///
/// This is the receiver functions are called with, so that a method
/// writing to `this` goes through whatever layer it was called on.
pub trait FieldAccess {
	/// Reads field `key`
	fn get(&self, key: &Key) -> Value;

	/// Writes field `key`
	fn set(&self, key: Key, value: Value);

	/// Calls the method in field `key` with `self` as the receiver.
	///
	/// Returns `Undefined` if the field isn't a function.
	fn invoke(&self, key: &Key, args: &[Value]) -> Value
	where
		Self: Sized,
	{
		match self.get(key) {
			Value::Function(function) => function.call(self, args),
			value => {
				tracing::warn!(%key, ?value, "Attempted to call a non-function field");
				Value::Undefined
			},
		}
	}
}

impl FieldAccess for Object {
	fn get(&self, key: &Key) -> Value {
		Self::get(self, key)
	}

	fn set(&self, key: Key, value: Value) {
		Self::set(self, key, value);
	}
}

impl FieldAccess for Value {
	fn get(&self, key: &Key) -> Value {
		Self::get(self, key)
	}

	fn set(&self, key: Key, value: Value) {
		match self {
			Self::Object(object) => object.set(key, value),
			_ => tracing::warn!(%key, value = ?self, "Ignoring write to a field of a non-object"),
		}
	}
}

#[cfg(test)]
mod test {
	use {super::*, crate::Function};

	#[test]
	fn invoke_receives_this() {
		let object = Object::from_iter([("count", Value::from(1))]);
		object.set(
			Key::new("increment"),
			Value::from(Function::new(|this, args| {
				let by = args.first().and_then(Value::as_number).unwrap_or(1.0);
				let count = this.get(&Key::new("count")).as_number().unwrap_or_default();
				this.set(Key::new("count"), Value::from(count + by));
				Value::Undefined
			})),
		);

		object.invoke(&Key::new("increment"), &[]);
		object.invoke(&Key::new("increment"), &[Value::from(5)]);
		assert_eq!(object.get(&Key::new("count")), Value::from(7));
	}

	#[test]
	fn invoke_non_function() {
		let object = Object::from_iter([("count", 1)]);
		assert_eq!(object.invoke(&Key::new("count"), &[]), Value::Undefined);
		assert_eq!(object.invoke(&Key::new("missing"), &[]), Value::Undefined);
	}

	#[test]
	fn write_to_non_object() {
		let value = Value::Null;
		value.set(Key::new("a"), Value::from(1));
		assert_eq!(FieldAccess::get(&value, &Key::new("a")), Value::Undefined);
	}
}
