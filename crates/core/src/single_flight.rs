//! At-most-one-running latch for the session bootstrap.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

/// Boolean latch: idle (`false`) or running (`true`).
///
/// Re-entry is a silent no-op so duplicate triggers from independent event
/// sources are tolerated.
#[derive(Debug, Default)]
pub struct SingleFlightGate {
	running: AtomicBool,
}

impl SingleFlightGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Moves the latch to running; returns `false` if it already was.
	pub fn try_enter(&self) -> bool {
		let entered = self.running.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok();
		if !entered {
			debug!(target = "pushboot.session", "bootstrap already running; ignoring re-entrant call");
		}
		entered
	}

	/// Resets the latch to idle.
	pub fn exit(&self) {
		self.running.store(false, Ordering::Release);
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::Acquire)
	}

	/// Scoped form of [`try_enter`](Self::try_enter); the latch resets when the guard drops,
	/// including on early return, error propagation and unwinding.
	pub fn enter(&self) -> Option<SingleFlightGuard<'_>> {
		self.try_enter().then_some(SingleFlightGuard { gate: self })
	}
}

/// Holds the latch until dropped.
#[must_use = "the latch is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SingleFlightGuard<'a> {
	gate: &'a SingleFlightGate,
}

impl Drop for SingleFlightGuard<'_> {
	fn drop(&mut self) {
		self.gate.exit();
	}
}
