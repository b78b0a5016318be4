//! Hook into the native permission-change observation API.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::host::NotificationPermission;
use crate::prompt::{BrowserIdentity, BrowserVendor, BrowserVersion};

/// Callback receiving every native permission change.
pub type PermissionListener = Box<dyn Fn(NotificationPermission) + Send + Sync>;

/// Native permission observation (`navigator.permissions` change events).
pub trait PermissionObserver: Send + Sync {
	/// Whether the host exposes change notifications at all.
	fn supports_observation(&self) -> bool;
	fn observe(&self, listener: PermissionListener);
}

/// Firefox before this version exposes the query API but never fires change events.
const FIREFOX_WORKING_PERMISSION_EVENTS: BrowserVersion = BrowserVersion::new(46, 0);

/// Installs the permission-change hook at most once.
#[derive(Debug, Default)]
pub struct PermissionChangeHookInstaller {
	installed: AtomicBool,
}

impl PermissionChangeHookInstaller {
	pub fn new() -> Self {
		Self::default()
	}

	/// Subscribes `on_change` to native notifications when the host supports them.
	///
	/// Returns `true` only for the call that actually installed the hook.
	pub fn install_if_supported<F>(&self, observer: &dyn PermissionObserver, browser: &BrowserIdentity, on_change: F) -> bool
	where
		F: Fn(NotificationPermission) + Send + Sync + 'static,
	{
		if !observer.supports_observation() || observation_is_broken(browser) {
			debug!(target = "pushboot.permission", vendor = ?browser.vendor, version = %browser.version, "native permission observation unavailable");
			return false;
		}

		if self.installed.swap(true, Ordering::AcqRel) {
			debug!(target = "pushboot.permission", "permission change hook already installed");
			return false;
		}

		observer.observe(Box::new(on_change));
		debug!(target = "pushboot.permission", "permission change hook installed");
		true
	}

	pub fn is_installed(&self) -> bool {
		self.installed.load(Ordering::Acquire)
	}
}

fn observation_is_broken(browser: &BrowserIdentity) -> bool {
	browser.vendor == BrowserVendor::Firefox && browser.version < FIREFOX_WORKING_PERMISSION_EVENTS
}
