//! Lifecycle events and one-way readiness signals.

use serde::Serialize;
use tokio::sync::watch;

use crate::host::NotificationPermission;
use crate::renewal::RenewalOutcome;

/// Events broadcast to interested parties on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SdkEvent {
	/// An auto-init session bootstrap finished.
	SessionReady,
	NotificationPermissionChanged { from: NotificationPermission, to: NotificationPermission },
	SubscriptionRenewed { outcome: RenewalOutcome },
	/// A native grant produced a registered subscription.
	Subscribed { endpoint: String },
	/// Public readiness: the post-initialization sequence completed.
	Initialized,
}

/// Level-triggered signal: once raised it stays raised, and late waiters return immediately.
#[derive(Debug)]
pub struct Signal {
	tx: watch::Sender<bool>,
}

impl Default for Signal {
	fn default() -> Self {
		Self::new()
	}
}

impl Signal {
	pub fn new() -> Self {
		let (tx, _) = watch::channel(false);
		Self { tx }
	}

	pub fn raise(&self) {
		self.tx.send_replace(true);
	}

	pub fn is_raised(&self) -> bool {
		*self.tx.borrow()
	}

	pub async fn wait(&self) {
		let mut rx = self.tx.subscribe();
		// the sender lives in `self`, so the channel cannot close while we wait
		let _ = rx.wait_for(|raised| *raised).await;
	}
}
