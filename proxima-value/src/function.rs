//! Function

// Imports
use {
	crate::{FieldAccess, Value},
	core::fmt,
	proxima_sync_types::{Rc, SyncBounds},
};

/// Function body.
///
/// Receives the receiver (`this`) it was called on, and the arguments.
pub type FunctionFn = proxima_sync_types::dyn_sync!(Fn(&dyn FieldAccess, &[Value]) -> Value);

/// Function
pub struct Function {
	/// Inner
	inner: Rc<FunctionFn>,
}

impl Function {
	/// Creates a new function
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&dyn FieldAccess, &[Value]) -> Value + SyncBounds + 'static,
	{
		Self { inner: Rc::new(f) }
	}

	/// Calls this function with receiver `this`
	pub fn call(&self, this: &dyn FieldAccess, args: &[Value]) -> Value {
		(self.inner)(this, args)
	}

	/// Returns a unique identifier to this function.
	///
	/// Cloning the function will retain the same id
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).cast::<()>().addr()
	}

	/// Returns if `self` and `other` are the same function
	#[must_use]
	pub fn is(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Clone for Function {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl fmt::Debug for Function {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<function@{:#x}>", self.id())
	}
}
