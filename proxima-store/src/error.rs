//! Errors

/// Store error
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(thiserror::Error)]
pub enum StoreError {
	/// No mutation interception primitive is available
	#[error("Mutation interception is not supported in this environment")]
	EnvironmentUnsupported,
}
