//! Helper crate for `proxima`.
//!
//! Helps select single-threaded vs multi-threaded primitives.
//!
//! With the `sync` feature, every shared value uses [`Arc`](std::sync::Arc) and a
//! `parking_lot` lock, and every callback must be `Send + Sync`. Without it, the
//! single-threaded [`Rc`](std::rc::Rc) / [`RefCell`](core::cell::RefCell) pair is used.

#[cfg(feature = "sync")]
mod private {
	pub type Rc<T> = std::sync::Arc<T>;
	pub type Weak<T> = std::sync::Weak<T>;
	pub type IMut<T> = parking_lot::RwLock<T>;
	pub type IMutRef<'a, T> = parking_lot::RwLockReadGuard<'a, T>;
	pub type IMutRefMut<'a, T> = parking_lot::RwLockWriteGuard<'a, T>;

	/// Bounds required of everything shared between threads
	pub trait SyncBounds: Send + Sync {}
	impl<T: ?Sized + Send + Sync> SyncBounds for T {}

	impl<T: ?Sized> crate::IMutExt<T> for IMut<T> {
		fn imut_read(&self) -> IMutRef<'_, T> {
			self.read()
		}

		fn imut_write(&self) -> IMutRefMut<'_, T> {
			self.write()
		}

		fn imut_try_read(&self) -> Option<IMutRef<'_, T>> {
			self.try_read()
		}
	}

	/// Exclusive section.
	///
	/// Re-entrant on the owning thread, blocks every other thread.
	#[derive(Default, Debug)]
	pub struct Exclusive(parking_lot::ReentrantMutex<()>);

	/// Guard of an [`Exclusive`] section
	pub type ExclusiveGuard<'a> = parking_lot::ReentrantMutexGuard<'a, ()>;

	impl Exclusive {
		/// Creates a new exclusive section
		#[must_use]
		pub const fn new() -> Self {
			Self(parking_lot::const_reentrant_mutex(()))
		}

		/// Enters the section, waiting for any other thread to leave it
		pub fn enter(&self) -> ExclusiveGuard<'_> {
			self.0.lock()
		}
	}

	/// Expands to `dyn $bounds + Send + Sync`
	#[macro_export]
	macro_rules! dyn_sync {
		($($bounds:tt)*) => { dyn $($bounds)* + Send + Sync };
	}
}

#[cfg(not(feature = "sync"))]
mod private {
	use core::marker::PhantomData;

	pub type Rc<T> = std::rc::Rc<T>;
	pub type Weak<T> = std::rc::Weak<T>;
	pub type IMut<T> = core::cell::RefCell<T>;
	pub type IMutRef<'a, T> = core::cell::Ref<'a, T>;
	pub type IMutRefMut<'a, T> = core::cell::RefMut<'a, T>;

	/// Bounds required of everything shared between threads
	pub trait SyncBounds {}
	impl<T: ?Sized> SyncBounds for T {}

	impl<T: ?Sized> crate::IMutExt<T> for IMut<T> {
		#[track_caller]
		fn imut_read(&self) -> IMutRef<'_, T> {
			self.borrow()
		}

		#[track_caller]
		fn imut_write(&self) -> IMutRefMut<'_, T> {
			self.borrow_mut()
		}

		fn imut_try_read(&self) -> Option<IMutRef<'_, T>> {
			self.try_borrow().ok()
		}
	}

	/// Exclusive section.
	///
	/// Single-threaded, so entering it never waits.
	#[derive(Default, Debug)]
	pub struct Exclusive(());

	/// Guard of an [`Exclusive`] section
	pub type ExclusiveGuard<'a> = PhantomData<&'a ()>;

	impl Exclusive {
		/// Creates a new exclusive section
		#[must_use]
		pub const fn new() -> Self {
			Self(())
		}

		/// Enters the section
		pub const fn enter(&self) -> ExclusiveGuard<'_> {
			PhantomData
		}
	}

	/// Expands to `dyn $bounds`
	#[macro_export]
	macro_rules! dyn_sync {
		($($bounds:tt)*) => { dyn $($bounds)* };
	}
}

pub use private::*;

/// Extension methods for the inner-mutability types.
pub trait IMutExt<T: ?Sized> {
	fn imut_read(&self) -> IMutRef<'_, T>;
	fn imut_write(&self) -> IMutRefMut<'_, T>;
	fn imut_try_read(&self) -> Option<IMutRef<'_, T>>;
}
