//! Error types for the bootstrap core.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by bootstrap components and host collaborators.
#[derive(Debug, Error)]
pub enum Error {
	/// The public entry point was called more than once for this page.
	#[error("SDK already initialized for this page")]
	DuplicateInitialization,

	/// The visitor dismissed the slide-down or modal prompt.
	#[error("permission prompt dismissed")]
	PermissionPromptDismissed,

	/// Push is already enabled; there is nothing to prompt for.
	#[error("already subscribed")]
	AlreadySubscribed,

	/// Permission was denied before this page load.
	///
	/// `redundant` marks denials that were already reported once this session.
	#[error("notification permission already denied")]
	PermissionAlreadyDenied { redundant: bool },

	/// The native prompt closed without a grant.
	#[error("notification permission not granted")]
	PermissionNotGranted,

	#[error("timed out: {0}")]
	Timeout(String),

	#[error("operation cancelled")]
	Cancelled,

	#[error("frame channel closed before a reply arrived")]
	ChannelClosed,

	#[error("protocol error: {0}")]
	Protocol(String),

	/// A remote handler on the other side of the frame boundary failed.
	#[error("remote command failed: {0}")]
	Remote(String),

	#[error("storage error: {0}")]
	Storage(String),

	#[error("subscription error: {0}")]
	Subscription(String),

	#[error("backend error: {0}")]
	Backend(String),

	#[error("display predicate failed: {0}")]
	DisplayPredicate(String),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns `true` for expected prompt-flow outcomes that only warrant a debug log.
	pub fn is_benign(&self) -> bool {
		matches!(
			self,
			Self::PermissionPromptDismissed | Self::AlreadySubscribed | Self::PermissionAlreadyDenied { .. } | Self::PermissionNotGranted
		)
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prompt_flow_errors_are_benign() {
		assert!(Error::PermissionPromptDismissed.is_benign());
		assert!(Error::AlreadySubscribed.is_benign());
		assert!(Error::PermissionAlreadyDenied { redundant: true }.is_benign());
		assert!(Error::PermissionNotGranted.is_benign());
	}

	#[test]
	fn infrastructure_errors_are_not_benign() {
		assert!(!Error::DuplicateInitialization.is_benign());
		assert!(!Error::Timeout("reply".into()).is_benign());
		assert!(!Error::Subscription("push service down".into()).is_benign());
		assert!(Error::Timeout("reply".into()).is_timeout());
	}
}
