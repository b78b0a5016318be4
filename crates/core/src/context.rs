//! Per-page bootstrap state owned by the [`Sdk`](crate::Sdk) instance.
//!
//! Created once at page load and never torn down. Prompt and denial flags are
//! page-scoped and survive across session bootstraps.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::bootstrap::BootstrapState;
use crate::error::{Error, Result};
use crate::events::{SdkEvent, Signal};
use crate::host::NotificationPermission;
use crate::permission_hook::PermissionChangeHookInstaller;
use crate::single_flight::{SingleFlightGate, SingleFlightGuard};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Subscription facts captured when the SDK finished initializing, used to compute deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
	pub push_enabled: bool,
	pub permission: NotificationPermission,
	pub opted_out: bool,
}

pub struct BootstrapContext {
	gate: SingleFlightGate,
	pub(crate) permission_hook: PermissionChangeHookInstaller,
	init_called: AtomicBool,
	state: Mutex<BootstrapState>,
	baseline: Mutex<Option<Baseline>>,
	denial_reported: AtomicBool,
	prompt_shown: AtomicBool,
	skip_welcome_notification: AtomicBool,
	events: broadcast::Sender<SdkEvent>,
	/// Bumped every time a session bootstrap finalizes.
	session_runs: watch::Sender<u64>,
	session_ready: Signal,
	initialized: Signal,
}

impl Default for BootstrapContext {
	fn default() -> Self {
		Self::new()
	}
}

impl BootstrapContext {
	pub fn new() -> Self {
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
		let (session_runs, _) = watch::channel(0);
		Self {
			gate: SingleFlightGate::new(),
			permission_hook: PermissionChangeHookInstaller::new(),
			init_called: AtomicBool::new(false),
			state: Mutex::new(BootstrapState::NotStarted),
			baseline: Mutex::new(None),
			denial_reported: AtomicBool::new(false),
			prompt_shown: AtomicBool::new(false),
			skip_welcome_notification: AtomicBool::new(false),
			events,
			session_runs,
			session_ready: Signal::new(),
			initialized: Signal::new(),
		}
	}

	/// Marks the public entry point as called; a second call fails.
	pub fn begin_initialization(&self) -> Result<()> {
		if self.init_called.swap(true, Ordering::AcqRel) {
			return Err(Error::DuplicateInitialization);
		}
		Ok(())
	}

	pub fn state(&self) -> BootstrapState {
		*self.state.lock()
	}

	pub(crate) fn set_state(&self, state: BootstrapState) {
		let previous = std::mem::replace(&mut *self.state.lock(), state);
		if previous != state {
			debug!(target = "pushboot.session", from = ?previous, to = ?state, "bootstrap state");
		}
	}

	pub fn is_running(&self) -> bool {
		self.gate.is_running()
	}

	pub fn baseline(&self) -> Option<Baseline> {
		*self.baseline.lock()
	}

	pub(crate) fn capture_baseline(&self, baseline: Baseline) {
		*self.baseline.lock() = Some(baseline);
	}

	/// Applies a native permission change to the baseline and broadcasts the delta.
	///
	/// Returns the previous permission when it actually changed.
	pub fn record_permission_change(&self, to: NotificationPermission) -> Option<NotificationPermission> {
		let from = {
			let mut baseline = self.baseline.lock();
			let Some(baseline) = baseline.as_mut() else {
				debug!(target = "pushboot.permission", ?to, "permission changed before baseline capture; ignoring");
				return None;
			};
			if baseline.permission == to {
				return None;
			}
			std::mem::replace(&mut baseline.permission, to)
		};

		info!(target = "pushboot.permission", ?from, ?to, "notification permission changed");
		self.emit(SdkEvent::NotificationPermissionChanged { from, to });
		Some(from)
	}

	/// Records a denial; returns `true` when one was already recorded this page load.
	pub(crate) fn note_denial(&self) -> bool {
		self.denial_reported.swap(true, Ordering::AcqRel)
	}

	pub(crate) fn prompt_shown(&self) -> bool {
		self.prompt_shown.load(Ordering::Acquire)
	}

	pub(crate) fn mark_prompt_shown(&self) {
		self.prompt_shown.store(true, Ordering::Release);
	}

	pub fn skip_welcome_notification(&self) -> bool {
		self.skip_welcome_notification.load(Ordering::Acquire)
	}

	pub(crate) fn set_skip_welcome_notification(&self) {
		self.skip_welcome_notification.store(true, Ordering::Release);
	}

	pub fn subscribe_events(&self) -> broadcast::Receiver<SdkEvent> {
		self.events.subscribe()
	}

	pub(crate) fn emit(&self, event: SdkEvent) {
		// no receivers is fine
		let _ = self.events.send(event);
	}

	pub(crate) fn watch_session_runs(&self) -> watch::Receiver<u64> {
		self.session_runs.subscribe()
	}

	/// Takes the latch for one session bootstrap; `None` when another one holds it.
	///
	/// Finalization runs when the returned [`SessionRun`] drops, so a run whose
	/// future is dropped mid-flight still releases the latch and wakes waiters.
	pub(crate) fn begin_session(&self, from_auto_init: bool) -> Option<SessionRun<'_>> {
		let latch = self.gate.enter()?;
		Some(SessionRun {
			context: self,
			latch: Some(latch),
			from_auto_init,
		})
	}

	pub fn session_ready(&self) -> &Signal {
		&self.session_ready
	}

	pub fn initialized(&self) -> &Signal {
		&self.initialized
	}
}

/// One in-flight session bootstrap. Dropping it performs finalization.
pub(crate) struct SessionRun<'a> {
	context: &'a BootstrapContext,
	latch: Option<SingleFlightGuard<'a>>,
	from_auto_init: bool,
}

impl Drop for SessionRun<'_> {
	fn drop(&mut self) {
		let context = self.context;
		context.set_state(BootstrapState::Finalizing);
		// release before waking waiters so a retry can take the latch
		drop(self.latch.take());
		context.session_runs.send_modify(|runs| *runs += 1);
		if self.from_auto_init {
			context.session_ready.raise();
			context.emit(SdkEvent::SessionReady);
		}
		context.set_state(BootstrapState::Done);
	}
}
