//! Deferral of work until the page is the active tab.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

/// Handle returned by [`DocumentVisibility::add_listener`].
pub type ListenerId = u64;

/// Callback invoked with the new visibility on every visibility-change signal.
pub type VisibilityListener = Box<dyn Fn(bool) + Send + Sync>;

/// Document visibility as exposed by the host page.
pub trait DocumentVisibility: Send + Sync {
	fn is_visible(&self) -> bool;
	fn add_listener(&self, listener: VisibilityListener) -> ListenerId;
	fn remove_listener(&self, id: ListenerId);
}

/// Suspends callers until the document is visible.
///
/// There is no timeout; a hidden tab that never becomes visible keeps the
/// waiter parked until the page is torn down.
#[derive(Clone)]
pub struct VisibilityGate {
	document: Arc<dyn DocumentVisibility>,
}

impl VisibilityGate {
	pub fn new(document: Arc<dyn DocumentVisibility>) -> Self {
		Self { document }
	}

	pub fn is_visible(&self) -> bool {
		self.document.is_visible()
	}

	/// Runs `task` immediately if visible, otherwise once the page becomes visible.
	pub async fn run_when_visible<F>(&self, task: F) -> F::Output
	where
		F: Future,
	{
		self.wait_until_visible().await;
		task.await
	}

	/// Resolves once the document reports visible.
	///
	/// The one-shot listener is removed before this returns, and also when the
	/// returned future is dropped early.
	pub async fn wait_until_visible(&self) {
		if self.document.is_visible() {
			return;
		}

		let (tx, mut rx) = mpsc::unbounded_channel();
		let registration = Registration {
			document: Arc::clone(&self.document),
			id: self.document.add_listener(Box::new(move |visible| {
				let _ = tx.send(visible);
			})),
		};

		// a change between the first check and arming the listener would be lost otherwise
		if !self.document.is_visible() {
			debug!(target = "pushboot.visibility", "document hidden; waiting for visibility change");
			while let Some(visible) = rx.recv().await {
				if visible {
					break;
				}
			}
		}

		drop(registration);
		debug!(target = "pushboot.visibility", "document visible");
	}
}

struct Registration {
	document: Arc<dyn DocumentVisibility>,
	id: ListenerId,
}

impl Drop for Registration {
	fn drop(&mut self) {
		self.document.remove_listener(self.id);
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicBool, Ordering};

	use super::*;
	use crate::fake::FakePage;

	#[tokio::test]
	async fn visible_document_runs_immediately() {
		let page = Arc::new(FakePage::secure());
		let gate = VisibilityGate::new(page.clone());
		assert_eq!(gate.run_when_visible(async { 7 }).await, 7);
		assert_eq!(page.visibility_listener_count(), 0);
		assert_eq!(page.visibility_listeners_added(), 0);
	}

	#[tokio::test]
	async fn hidden_document_waits_for_visible_signal() {
		let page = Arc::new(FakePage::secure());
		page.set_visible_silently(false);
		let gate = VisibilityGate::new(page.clone());
		let ran = Arc::new(AtomicBool::new(false));

		let handle = tokio::spawn({
			let ran = Arc::clone(&ran);
			async move {
				gate.run_when_visible(async move { ran.store(true, Ordering::SeqCst) }).await;
			}
		});

		page.wait_for_visibility_listener().await;
		page.fire_visibility_change(false);
		tokio::task::yield_now().await;
		assert!(!ran.load(Ordering::SeqCst));
		assert_eq!(page.visibility_listener_count(), 1);

		page.fire_visibility_change(true);
		handle.await.unwrap();
		assert!(ran.load(Ordering::SeqCst));
		assert_eq!(page.visibility_listener_count(), 0);
		assert_eq!(page.visibility_listeners_added(), 1);
	}

	#[tokio::test]
	async fn dropped_waiter_removes_listener() {
		let page = Arc::new(FakePage::secure());
		page.set_visible_silently(false);
		let gate = VisibilityGate::new(page.clone());

		let wait = tokio::time::timeout(std::time::Duration::from_millis(20), gate.wait_until_visible()).await;
		assert!(wait.is_err());
		assert_eq!(page.visibility_listener_count(), 0);
	}
}
