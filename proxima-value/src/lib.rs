//! Dynamic values for `proxima`.
//!
//! Models the kind of object a store observes: shared, mutable, with fields
//! addressed by [`Key`], optional per-field setters and callable fields.

// Modules
pub mod access;
pub mod function;
pub mod key;
pub mod object;
pub mod value;

// Exports
pub use self::{
	access::FieldAccess,
	function::Function,
	key::Key,
	object::{Fields, Object},
	value::Value,
};
