//! Dispatch

// Imports
use {
	core::{any::Any, fmt, panic::AssertUnwindSafe},
	std::panic,
};

/// Callback dispatch.
///
/// A panicking callback doesn't prevent the remaining ones from running.
/// The first panic is resumed once the dispatch is finished.
#[derive(Default)]
pub struct Dispatch {
	/// First panic payload
	panic: Option<Box<dyn Any + Send>>,

	/// Number of callbacks that panicked
	panicked: usize,
}

impl Dispatch {
	/// Starts a new dispatch
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs a callback.
	///
	/// Returns `None` if it panicked.
	pub fn run<F, R>(&mut self, callback: &dyn fmt::Display, f: F) -> Option<R>
	where
		F: FnOnce() -> R,
	{
		match panic::catch_unwind(AssertUnwindSafe(f)) {
			Ok(value) => Some(value),
			Err(payload) => {
				tracing::error!(%callback, panic = self::panic_message(&*payload), "Callback panicked");
				self.panicked += 1;
				if self.panic.is_none() {
					self.panic = Some(payload);
				}

				None
			},
		}
	}

	/// Finishes this dispatch, resuming the first panic, if any
	pub fn finish(self) {
		if let Some(payload) = self.panic {
			tracing::debug!(panicked = self.panicked, "Resuming first panic of dispatch");
			panic::resume_unwind(payload);
		}
	}
}

/// Gets the message out of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return msg;
	}

	match payload.downcast_ref::<String>() {
		Some(msg) => msg,
		None => "<non-string payload>",
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn no_panic() {
		let mut dispatch = Dispatch::new();
		assert_eq!(dispatch.run(&"a", || 5), Some(5));
		dispatch.finish();
	}

	#[test]
	fn panic_continues() {
		let mut ran = vec![];
		let mut dispatch = Dispatch::new();
		assert_eq!(dispatch.run(&"a", || -> u32 { panic!("first") }), None);
		dispatch.run(&"b", || ran.push("b"));
		assert_eq!(dispatch.run(&"c", || -> u32 { panic!("second") }), None);
		dispatch.run(&"d", || ran.push("d"));
		assert_eq!(ran, ["b", "d"]);

		let payload = panic::catch_unwind(AssertUnwindSafe(|| dispatch.finish())).expect_err("Should resume the panic");
		assert_eq!(self::panic_message(&*payload), "first");
	}

	#[test]
	fn formatted_payload() {
		let value = 5;
		let payload = panic::catch_unwind(move || -> u32 { panic!("value: {value}") }).expect_err("Should panic");
		assert_eq!(self::panic_message(&*payload), "value: 5");
	}
}
