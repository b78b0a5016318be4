//! Bootstrap states, per-call options and outcomes.

use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::prompt::Suppression;

/// Position of the session bootstrap state machine.
///
/// ```text
/// NotStarted → ClassifyingEnvironment → AwaitingVisibility? → SelectingStrategy
///            → ExecutingStrategy → Finalizing → Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootstrapState {
	#[default]
	NotStarted,
	ClassifyingEnvironment,
	/// Suspended until the document becomes visible; resumes at classification.
	AwaitingVisibility,
	SelectingStrategy,
	ExecutingStrategy,
	Finalizing,
	Done,
}

/// Why a session bootstrap was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapOptions {
	pub modal_prompt_requested: bool,
	pub from_explicit_register_call: bool,
	/// Started by the page-level initialization trigger.
	pub from_auto_init: bool,
	/// The visitor already accepted an intermediate UI; skip the slide-down.
	pub auto_accept: bool,
}

impl BootstrapOptions {
	pub fn auto_init() -> Self {
		Self {
			from_auto_init: true,
			..Self::default()
		}
	}

	pub fn register_call(modal: bool) -> Self {
		Self {
			from_explicit_register_call: true,
			modal_prompt_requested: modal,
			..Self::default()
		}
	}

	pub fn with_auto_accept(mut self) -> Self {
		self.auto_accept = true;
		self
	}
}

/// Side effect chosen during `SelectingStrategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionAction {
	NativePrompt,
	SlideDown,
	Modal,
	LegacyPrompt,
	/// Permission is granted but no subscription is registered; subscribe silently.
	Resubscribe,
	Suppressed(Suppression),
}

/// Result of one session bootstrap invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum BootstrapOutcome {
	/// Another bootstrap held the single-flight latch; nothing ran.
	AlreadyRunning,
	Completed { environment: Environment, action: SessionAction },
	/// A failure was caught and logged; the page carries on.
	Absorbed { environment: Environment, benign: bool, error: String },
}

impl BootstrapOutcome {
	pub fn environment(&self) -> Option<Environment> {
		match self {
			Self::AlreadyRunning => None,
			Self::Completed { environment, .. } | Self::Absorbed { environment, .. } => Some(*environment),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::environment::{FrameRole, IntegrationMode};

	#[test]
	fn register_call_carries_modal_flag() {
		let options = BootstrapOptions::register_call(true);
		assert!(options.from_explicit_register_call);
		assert!(options.modal_prompt_requested);
		assert!(!options.from_auto_init);
		assert!(BootstrapOptions::auto_init().with_auto_accept().auto_accept);
	}

	#[test]
	fn outcome_serializes_with_status_tag() {
		let outcome = BootstrapOutcome::Completed {
			environment: Environment {
				mode: IntegrationMode::DirectSecure,
				role: FrameRole::TopFrame,
			},
			action: SessionAction::Suppressed(Suppression::AlreadyPrompted),
		};
		let value = serde_json::to_value(&outcome).unwrap();
		assert_eq!(value["status"], "completed");
		assert_eq!(value["environment"]["mode"], "direct-secure");
		assert_eq!(value["action"]["suppressed"], "already-prompted");
		assert_eq!(serde_json::to_value(BootstrapOutcome::AlreadyRunning).unwrap()["status"], "already-running");
	}
}
