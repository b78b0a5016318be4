//! Collaborators supplied by the embedding page.
//!
//! The bootstrap core never touches browser APIs itself; each capability it
//! needs is a trait here, bundled into a [`Host`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::environment::WindowContext;
use crate::error::Result;
use crate::frame::FrameChannel;
use crate::permission_hook::PermissionObserver;
use crate::protocol::{DeviceRecord, SubscriptionRecord};
use crate::storage::KeyValueStore;
use crate::visibility::DocumentVisibility;

/// Native notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
	#[default]
	Default,
	Granted,
	Denied,
}

/// Permission and subscription inspection.
#[async_trait]
pub trait PermissionInspector: Send + Sync {
	async fn is_push_enabled(&self) -> Result<bool>;
	/// Permission for the given context (app id or push web id).
	async fn notification_permission(&self, context_id: &str) -> Result<NotificationPermission>;
	async fn is_opted_out(&self) -> Result<bool>;
}

/// How [`SubscriptionLifecycle::subscribe`] treats an existing subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubscribeStrategy {
	/// Reuse the current subscription when one exists.
	ResubscribeExisting,
	/// Always create a new credential.
	SubscribeNew,
}

/// Push subscription lifecycle service.
#[async_trait]
pub trait SubscriptionLifecycle: Send + Sync {
	async fn is_subscription_expiring(&self) -> Result<bool>;
	async fn subscribe(&self, strategy: SubscribeStrategy) -> Result<SubscriptionRecord>;
	async fn register_subscription(&self, record: &SubscriptionRecord) -> Result<()>;
	async fn is_already_registered(&self) -> Result<bool>;
	/// Flips the subscription flag without any permission prompt.
	async fn set_subscription_enabled(&self, enabled: bool) -> Result<()>;
}

/// Backend session counters.
#[async_trait]
pub trait BackendSync: Send + Sync {
	async fn update_user_session(&self, identity_id: &str, device: &DeviceRecord) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlidedownResponse {
	Accepted,
	Dismissed,
}

/// Visual prompts. Rendering is entirely the host's business.
#[async_trait]
pub trait PromptPresenter: Send + Sync {
	/// Requests native permission and resolves with the resulting state.
	async fn show_native(&self) -> Result<NotificationPermission>;
	async fn show_slidedown(&self) -> Result<SlidedownResponse>;
	/// Full-screen modal used by explicit register calls.
	async fn show_modal(&self) -> Result<()>;
	/// Popover shown on insecure origins, which cannot prompt natively.
	async fn show_legacy_prompt(&self) -> Result<()>;
}

/// Tri-state answer of a [`DisplayPredicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayDecision {
	Show,
	Hide,
	/// Create the widget hidden; the host may reveal it later.
	Defer,
}

/// Site-provided rule deciding whether the notify button appears.
pub trait DisplayPredicate: Send + Sync {
	fn evaluate(&self) -> Result<DisplayDecision>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetVisibility {
	Visible,
	Hidden,
}

#[async_trait]
pub trait WidgetHost: Send + Sync {
	async fn create_notify_button(&self, visibility: WidgetVisibility) -> Result<()>;
}

/// Static facts about the current document.
pub trait PageContext: Send + Sync {
	fn window_context(&self) -> WindowContext;
	fn user_agent(&self) -> String;
	fn language(&self) -> Option<String>;
	/// Offset from UTC in seconds.
	fn timezone_offset_secs(&self) -> i32;
}

#[async_trait]
pub trait ServiceWorkerBridge: Send + Sync {
	async fn has_active_worker(&self) -> Result<bool>;
	/// Opens a message channel to the already-active worker.
	async fn establish_channel(&self) -> Result<()>;
}

/// Installs the recurring external synchronization job.
pub trait SyncScheduler: Send + Sync {
	fn install(&self, interval: Duration) -> Result<()>;
}

/// Everything the page provides to the bootstrap.
#[derive(Clone)]
pub struct Host {
	pub page: Arc<dyn PageContext>,
	pub visibility: Arc<dyn DocumentVisibility>,
	pub permission_observer: Arc<dyn PermissionObserver>,
	pub storage: Arc<dyn KeyValueStore>,
	pub permissions: Arc<dyn PermissionInspector>,
	pub subscriptions: Arc<dyn SubscriptionLifecycle>,
	pub channel: Arc<dyn FrameChannel>,
	pub backend: Arc<dyn BackendSync>,
	pub prompts: Arc<dyn PromptPresenter>,
	pub widgets: Arc<dyn WidgetHost>,
	pub display_predicate: Option<Arc<dyn DisplayPredicate>>,
	pub service_worker: Arc<dyn ServiceWorkerBridge>,
	pub sync: Arc<dyn SyncScheduler>,
}
