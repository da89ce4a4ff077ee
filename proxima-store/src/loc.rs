//! Subscription location

// Imports
use core::{fmt, panic::Location};

/// Where a subscriber subscribed from.
///
/// Only recorded with `debug_assertions`, to keep release subscribers small.
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct Loc(Option<&'static Location<'static>>);

impl Loc {
	/// Gets the caller's location
	#[track_caller]
	#[must_use]
	pub const fn caller() -> Self {
		match cfg!(debug_assertions) {
			true => Self(Some(Location::caller())),
			false => Self(None),
		}
	}

	/// Returns the recorded location, if any
	#[must_use]
	pub const fn location(&self) -> Option<&'static Location<'static>> {
		self.0
	}
}

impl fmt::Display for Loc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0 {
			Some(location) => write!(f, "{}:{}", location.file(), location.line()),
			None => f.pad("<unknown>"),
		}
	}
}

impl fmt::Debug for Loc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	#[cfg(debug_assertions)]
	fn caller() {
		let loc = Loc::caller();
		let location = loc.location().expect("Location should be recorded");
		assert_eq!(location.file(), file!());
		assert_eq!(loc.to_string(), format!("{}:{}", file!(), location.line()));
	}
}
