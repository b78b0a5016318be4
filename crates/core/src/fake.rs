//! In-memory host collaborators for tests and simulation.
//!
//! Every fake records the calls it receives in a shared [`Journal`], so tests
//! can assert on ordering across collaborators. Behavior is scripted through
//! setters; defaults describe a visible, secure page with nothing subscribed.
//!
//! ```ignore
//! let fake = FakeHost::direct();
//! fake.subscriptions.set_expiring(true);
//! let sdk = fake.sdk()?;
//! sdk.init()?.await??;
//! assert!(fake.journal.appears_before("subscriptions.subscribe", "subscriptions.register"));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{Notify, watch};

use crate::bootstrap::Sdk;
use crate::config::SdkConfig;
use crate::environment::WindowContext;
use crate::error::{Error, Result};
use crate::frame::{FramePort, FramePostman};
use crate::host::{
	BackendSync, DisplayDecision, DisplayPredicate, Host, NotificationPermission, PageContext, PermissionInspector, PromptPresenter, ServiceWorkerBridge,
	SlidedownResponse, SubscribeStrategy, SubscriptionLifecycle, SyncScheduler, WidgetHost, WidgetVisibility,
};
use crate::permission_hook::{PermissionListener, PermissionObserver};
use crate::protocol::{DeviceRecord, FrameMessage, SubscriptionRecord};
use crate::storage::MemoryStore;
use crate::visibility::{DocumentVisibility, ListenerId, VisibilityListener};

/// Desktop Chrome, the user agent fake pages report unless told otherwise.
pub const CHROME_DESKTOP_UA: &str =
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SITE: &str = "https://shop.example.com/";
const INSECURE_SITE: &str = "http://shop.example.com/";
const PROXY_ORIGIN: &str = "https://shop.proxy.example";
const PROXY_FRAME: &str = "https://shop.proxy.example/subscribe";

/// Shared, ordered log of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct Journal {
	entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&self, entry: impl Into<String>) {
		self.entries.lock().push(entry.into());
	}

	pub fn entries(&self) -> Vec<String> {
		self.entries.lock().clone()
	}

	/// Number of entries starting with `prefix`.
	pub fn count(&self, prefix: &str) -> usize {
		self.entries.lock().iter().filter(|entry| entry.starts_with(prefix)).count()
	}

	/// Index of the first entry starting with `prefix`.
	pub fn position(&self, prefix: &str) -> Option<usize> {
		self.entries.lock().iter().position(|entry| entry.starts_with(prefix))
	}

	/// Whether the first `first` entry precedes the first `second` entry; both must exist.
	pub fn appears_before(&self, first: &str, second: &str) -> bool {
		matches!((self.position(first), self.position(second)), (Some(a), Some(b)) if a < b)
	}
}

/// Page facts, document visibility and native permission observation.
pub struct FakePage {
	window: Mutex<WindowContext>,
	user_agent: Mutex<String>,
	language: Option<String>,
	timezone_offset_secs: i32,
	visible: AtomicBool,
	next_listener: AtomicU64,
	visibility_listeners: Mutex<HashMap<ListenerId, Arc<dyn Fn(bool) + Send + Sync>>>,
	visibility_listeners_added: AtomicUsize,
	registered_listeners: watch::Sender<usize>,
	observation_supported: AtomicBool,
	permission_listeners: Mutex<Vec<Arc<dyn Fn(NotificationPermission) + Send + Sync>>>,
	journal: Journal,
}

impl FakePage {
	pub fn new(window: WindowContext, journal: Journal) -> Self {
		let (registered_listeners, _) = watch::channel(0);
		Self {
			window: Mutex::new(window),
			user_agent: Mutex::new(CHROME_DESKTOP_UA.to_string()),
			language: Some("en".to_string()),
			timezone_offset_secs: 0,
			visible: AtomicBool::new(true),
			next_listener: AtomicU64::new(1),
			visibility_listeners: Mutex::new(HashMap::new()),
			visibility_listeners_added: AtomicUsize::new(0),
			registered_listeners,
			observation_supported: AtomicBool::new(true),
			permission_listeners: Mutex::new(Vec::new()),
			journal,
		}
	}

	/// Visible top-level document on an https origin.
	pub fn secure() -> Self {
		Self::new(WindowContext::top(SITE), Journal::new())
	}

	pub fn window(&self) -> WindowContext {
		self.window.lock().clone()
	}

	pub fn set_window(&self, window: WindowContext) {
		*self.window.lock() = window;
	}

	pub fn set_user_agent(&self, user_agent: impl Into<String>) {
		*self.user_agent.lock() = user_agent.into();
	}

	/// Changes visibility without notifying listeners.
	pub fn set_visible_silently(&self, visible: bool) {
		self.visible.store(visible, Ordering::SeqCst);
	}

	/// Changes visibility and notifies every registered listener.
	pub fn fire_visibility_change(&self, visible: bool) {
		self.set_visible_silently(visible);
		self.journal.record(format!("page.visibility_change({visible})"));
		let listeners: Vec<_> = self.visibility_listeners.lock().values().cloned().collect();
		for listener in listeners {
			listener(visible);
		}
	}

	pub fn visibility_listener_count(&self) -> usize {
		self.visibility_listeners.lock().len()
	}

	/// Total listeners ever added.
	pub fn visibility_listeners_added(&self) -> usize {
		self.visibility_listeners_added.load(Ordering::SeqCst)
	}

	/// Resolves once at least one visibility listener is registered.
	pub async fn wait_for_visibility_listener(&self) {
		let mut rx = self.registered_listeners.subscribe();
		let _ = rx.wait_for(|count| *count > 0).await;
	}

	pub fn set_permission_observation(&self, supported: bool) {
		self.observation_supported.store(supported, Ordering::SeqCst);
	}

	pub fn permission_observer_count(&self) -> usize {
		self.permission_listeners.lock().len()
	}

	/// Delivers a native permission change to every observer.
	pub fn fire_permission_change(&self, permission: NotificationPermission) {
		self.journal.record(format!("page.permission_change({permission:?})"));
		let listeners = self.permission_listeners.lock().clone();
		for listener in listeners {
			listener(permission);
		}
	}
}

impl PageContext for FakePage {
	fn window_context(&self) -> WindowContext {
		self.window()
	}

	fn user_agent(&self) -> String {
		self.user_agent.lock().clone()
	}

	fn language(&self) -> Option<String> {
		self.language.clone()
	}

	fn timezone_offset_secs(&self) -> i32 {
		self.timezone_offset_secs
	}
}

impl DocumentVisibility for FakePage {
	fn is_visible(&self) -> bool {
		self.visible.load(Ordering::SeqCst)
	}

	fn add_listener(&self, listener: VisibilityListener) -> ListenerId {
		let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
		let count = {
			let mut listeners = self.visibility_listeners.lock();
			listeners.insert(id, Arc::from(listener));
			listeners.len()
		};
		self.visibility_listeners_added.fetch_add(1, Ordering::SeqCst);
		self.registered_listeners.send_replace(count);
		self.journal.record("page.add_visibility_listener");
		id
	}

	fn remove_listener(&self, id: ListenerId) {
		let count = {
			let mut listeners = self.visibility_listeners.lock();
			listeners.remove(&id);
			listeners.len()
		};
		self.registered_listeners.send_replace(count);
		self.journal.record("page.remove_visibility_listener");
	}
}

impl PermissionObserver for FakePage {
	fn supports_observation(&self) -> bool {
		self.observation_supported.load(Ordering::SeqCst)
	}

	fn observe(&self, listener: PermissionListener) {
		self.journal.record("page.observe_permission");
		self.permission_listeners.lock().push(Arc::from(listener));
	}
}

#[derive(Debug, Clone, Copy, Default)]
struct PermissionState {
	push_enabled: bool,
	permission: NotificationPermission,
	opted_out: bool,
}

/// Scripted permission and subscription inspection.
pub struct FakePermissions {
	state: Mutex<PermissionState>,
	failure: Mutex<Option<String>>,
	journal: Journal,
}

impl FakePermissions {
	pub fn new(journal: Journal) -> Self {
		Self {
			state: Mutex::new(PermissionState::default()),
			failure: Mutex::new(None),
			journal,
		}
	}

	pub fn set_permission(&self, permission: NotificationPermission) {
		self.state.lock().permission = permission;
	}

	pub fn set_push_enabled(&self, enabled: bool) {
		self.state.lock().push_enabled = enabled;
	}

	pub fn set_opted_out(&self, opted_out: bool) {
		self.state.lock().opted_out = opted_out;
	}

	/// Makes every subsequent query fail with `message`.
	pub fn fail_queries(&self, message: impl Into<String>) {
		*self.failure.lock() = Some(message.into());
	}

	fn check(&self) -> Result<PermissionState> {
		match self.failure.lock().clone() {
			Some(message) => Err(Error::Storage(message)),
			None => Ok(*self.state.lock()),
		}
	}
}

#[async_trait]
impl PermissionInspector for FakePermissions {
	async fn is_push_enabled(&self) -> Result<bool> {
		self.journal.record("permissions.is_push_enabled");
		Ok(self.check()?.push_enabled)
	}

	async fn notification_permission(&self, context_id: &str) -> Result<NotificationPermission> {
		self.journal.record(format!("permissions.notification_permission({context_id})"));
		Ok(self.check()?.permission)
	}

	async fn is_opted_out(&self) -> Result<bool> {
		self.journal.record("permissions.is_opted_out");
		Ok(self.check()?.opted_out)
	}
}

/// Push subscription service that hands out numbered endpoints.
pub struct FakeSubscriptions {
	expiring: AtomicBool,
	already_registered: AtomicBool,
	issued: AtomicUsize,
	registered: Mutex<Vec<SubscriptionRecord>>,
	enabled: Mutex<Option<bool>>,
	subscribe_failure: Mutex<Option<String>>,
	register_failure: Mutex<Option<String>>,
	journal: Journal,
}

impl FakeSubscriptions {
	pub fn new(journal: Journal) -> Self {
		Self {
			expiring: AtomicBool::new(false),
			already_registered: AtomicBool::new(false),
			issued: AtomicUsize::new(0),
			registered: Mutex::new(Vec::new()),
			enabled: Mutex::new(None),
			subscribe_failure: Mutex::new(None),
			register_failure: Mutex::new(None),
			journal,
		}
	}

	pub fn set_expiring(&self, expiring: bool) {
		self.expiring.store(expiring, Ordering::SeqCst);
	}

	pub fn set_already_registered(&self, registered: bool) {
		self.already_registered.store(registered, Ordering::SeqCst);
	}

	pub fn fail_subscribe(&self, message: impl Into<String>) {
		*self.subscribe_failure.lock() = Some(message.into());
	}

	pub fn fail_register(&self, message: impl Into<String>) {
		*self.register_failure.lock() = Some(message.into());
	}

	/// Records registered so far, oldest first.
	pub fn registered(&self) -> Vec<SubscriptionRecord> {
		self.registered.lock().clone()
	}

	/// Last value passed to `set_subscription_enabled`.
	pub fn enabled(&self) -> Option<bool> {
		*self.enabled.lock()
	}
}

#[async_trait]
impl SubscriptionLifecycle for FakeSubscriptions {
	async fn is_subscription_expiring(&self) -> Result<bool> {
		self.journal.record("subscriptions.is_expiring");
		Ok(self.expiring.load(Ordering::SeqCst))
	}

	async fn subscribe(&self, strategy: SubscribeStrategy) -> Result<SubscriptionRecord> {
		let strategy = match strategy {
			SubscribeStrategy::ResubscribeExisting => "resubscribe-existing",
			SubscribeStrategy::SubscribeNew => "subscribe-new",
		};
		self.journal.record(format!("subscriptions.subscribe({strategy})"));
		if let Some(message) = self.subscribe_failure.lock().clone() {
			return Err(Error::Subscription(message));
		}
		let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
		Ok(SubscriptionRecord::new(format!("https://push.example/sub/{n}")).with_keys(format!("p256dh-{n}"), format!("auth-{n}")))
	}

	async fn register_subscription(&self, record: &SubscriptionRecord) -> Result<()> {
		self.journal.record(format!("subscriptions.register({})", record.endpoint));
		if let Some(message) = self.register_failure.lock().clone() {
			return Err(Error::Subscription(message));
		}
		self.registered.lock().push(record.clone());
		self.already_registered.store(true, Ordering::SeqCst);
		self.expiring.store(false, Ordering::SeqCst);
		Ok(())
	}

	async fn is_already_registered(&self) -> Result<bool> {
		self.journal.record("subscriptions.is_already_registered");
		Ok(self.already_registered.load(Ordering::SeqCst))
	}

	async fn set_subscription_enabled(&self, enabled: bool) -> Result<()> {
		self.journal.record(format!("subscriptions.set_enabled({enabled})"));
		*self.enabled.lock() = Some(enabled);
		Ok(())
	}
}

/// Backend that records session updates.
pub struct FakeBackend {
	sessions: Mutex<Vec<(String, DeviceRecord)>>,
	failure: Mutex<Option<String>>,
	journal: Journal,
}

impl FakeBackend {
	pub fn new(journal: Journal) -> Self {
		Self {
			sessions: Mutex::new(Vec::new()),
			failure: Mutex::new(None),
			journal,
		}
	}

	pub fn fail_updates(&self, message: impl Into<String>) {
		*self.failure.lock() = Some(message.into());
	}

	pub fn sessions(&self) -> Vec<(String, DeviceRecord)> {
		self.sessions.lock().clone()
	}
}

#[async_trait]
impl BackendSync for FakeBackend {
	async fn update_user_session(&self, identity_id: &str, device: &DeviceRecord) -> Result<()> {
		self.journal.record(format!("backend.update_user_session({identity_id})"));
		if let Some(message) = self.failure.lock().clone() {
			return Err(Error::Backend(message));
		}
		self.sessions.lock().push((identity_id.to_string(), device.clone()));
		Ok(())
	}
}

/// Prompts with scripted visitor responses.
pub struct FakePrompts {
	native: Mutex<NotificationPermission>,
	slidedown: Mutex<SlidedownResponse>,
	failure: Mutex<Option<String>>,
	journal: Journal,
}

impl FakePrompts {
	/// Visitor grants the native prompt and accepts the slide-down.
	pub fn new(journal: Journal) -> Self {
		Self {
			native: Mutex::new(NotificationPermission::Granted),
			slidedown: Mutex::new(SlidedownResponse::Accepted),
			failure: Mutex::new(None),
			journal,
		}
	}

	pub fn answer_native(&self, permission: NotificationPermission) {
		*self.native.lock() = permission;
	}

	pub fn answer_slidedown(&self, response: SlidedownResponse) {
		*self.slidedown.lock() = response;
	}

	/// Makes every prompt fail to render.
	pub fn fail_rendering(&self, message: impl Into<String>) {
		*self.failure.lock() = Some(message.into());
	}

	fn rendered(&self, name: &str) -> Result<()> {
		self.journal.record(format!("prompts.{name}"));
		match self.failure.lock().clone() {
			Some(message) => Err(Error::Backend(message)),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl PromptPresenter for FakePrompts {
	async fn show_native(&self) -> Result<NotificationPermission> {
		self.rendered("native")?;
		Ok(*self.native.lock())
	}

	async fn show_slidedown(&self) -> Result<SlidedownResponse> {
		self.rendered("slidedown")?;
		Ok(*self.slidedown.lock())
	}

	async fn show_modal(&self) -> Result<()> {
		self.rendered("modal")
	}

	async fn show_legacy_prompt(&self) -> Result<()> {
		self.rendered("legacy")
	}
}

/// Display predicate with a fixed answer, or a failure when the answer is `None`.
pub struct FakeDisplayPredicate {
	decision: Option<DisplayDecision>,
}

impl FakeDisplayPredicate {
	pub fn new(decision: DisplayDecision) -> Self {
		Self { decision: Some(decision) }
	}

	pub fn failing() -> Self {
		Self { decision: None }
	}
}

impl DisplayPredicate for FakeDisplayPredicate {
	fn evaluate(&self) -> Result<DisplayDecision> {
		self.decision.ok_or_else(|| Error::DisplayPredicate("predicate threw".into()))
	}
}

pub struct FakeWidgets {
	created: Mutex<Vec<WidgetVisibility>>,
	journal: Journal,
}

impl FakeWidgets {
	pub fn new(journal: Journal) -> Self {
		Self {
			created: Mutex::new(Vec::new()),
			journal,
		}
	}

	pub fn created(&self) -> Vec<WidgetVisibility> {
		self.created.lock().clone()
	}
}

#[async_trait]
impl WidgetHost for FakeWidgets {
	async fn create_notify_button(&self, visibility: WidgetVisibility) -> Result<()> {
		self.journal.record(format!("widgets.notify_button({visibility:?})"));
		self.created.lock().push(visibility);
		Ok(())
	}
}

pub struct FakeServiceWorker {
	active: AtomicBool,
	failure: Mutex<Option<String>>,
	channels: AtomicUsize,
	journal: Journal,
}

impl FakeServiceWorker {
	pub fn new(journal: Journal) -> Self {
		Self {
			active: AtomicBool::new(false),
			failure: Mutex::new(None),
			channels: AtomicUsize::new(0),
			journal,
		}
	}

	pub fn set_active(&self, active: bool) {
		self.active.store(active, Ordering::SeqCst);
	}

	pub fn fail_channel(&self, message: impl Into<String>) {
		*self.failure.lock() = Some(message.into());
	}

	pub fn channels(&self) -> usize {
		self.channels.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ServiceWorkerBridge for FakeServiceWorker {
	async fn has_active_worker(&self) -> Result<bool> {
		Ok(self.active.load(Ordering::SeqCst))
	}

	async fn establish_channel(&self) -> Result<()> {
		self.journal.record("worker.establish_channel");
		if let Some(message) = self.failure.lock().clone() {
			return Err(Error::Remote(message));
		}
		self.channels.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

pub struct FakeSync {
	installed: Mutex<Vec<Duration>>,
	journal: Journal,
}

impl FakeSync {
	pub fn new(journal: Journal) -> Self {
		Self {
			installed: Mutex::new(Vec::new()),
			journal,
		}
	}

	pub fn installed(&self) -> Vec<Duration> {
		self.installed.lock().clone()
	}
}

impl SyncScheduler for FakeSync {
	fn install(&self, interval: Duration) -> Result<()> {
		self.journal.record(format!("sync.install({}s)", interval.as_secs()));
		self.installed.lock().push(interval);
		Ok(())
	}
}

/// Frame port that captures every posted envelope.
#[derive(Default)]
pub struct FakePort {
	sent: Mutex<Vec<FrameMessage>>,
	unread: Mutex<VecDeque<FrameMessage>>,
	posted: Notify,
}

impl FakePort {
	pub fn new() -> Self {
		Self::default()
	}

	/// Takes every envelope posted since the last call.
	pub fn take_sent(&self) -> Vec<FrameMessage> {
		std::mem::take(&mut *self.sent.lock())
	}

	/// Waits for the next envelope not yet returned by this method.
	pub async fn next_sent(&self) -> FrameMessage {
		loop {
			if let Some(message) = self.unread.lock().pop_front() {
				return message;
			}
			self.posted.notified().await;
		}
	}
}

impl FramePort for FakePort {
	fn post(&self, message: Value) -> Result<()> {
		let message: FrameMessage = serde_json::from_value(message)?;
		self.sent.lock().push(message.clone());
		self.unread.lock().push_back(message);
		self.posted.notify_one();
		Ok(())
	}
}

/// A complete fake [`Host`] plus handles for scripting and inspection.
pub struct FakeHost {
	pub config: SdkConfig,
	pub journal: Journal,
	pub page: Arc<FakePage>,
	pub storage: Arc<MemoryStore>,
	pub permissions: Arc<FakePermissions>,
	pub subscriptions: Arc<FakeSubscriptions>,
	pub backend: Arc<FakeBackend>,
	pub prompts: Arc<FakePrompts>,
	pub widgets: Arc<FakeWidgets>,
	pub service_worker: Arc<FakeServiceWorker>,
	pub sync: Arc<FakeSync>,
	pub port: Arc<FakePort>,
	pub postman: Arc<FramePostman>,
	pub display_predicate: Option<Arc<dyn DisplayPredicate>>,
}

impl FakeHost {
	pub fn new(config: SdkConfig, window: WindowContext) -> Self {
		let journal = Journal::new();
		let port = Arc::new(FakePort::new());
		let postman = FramePostman::new(port.clone(), config.rpc_timeout());
		Self {
			page: Arc::new(FakePage::new(window, journal.clone())),
			storage: Arc::new(MemoryStore::new()),
			permissions: Arc::new(FakePermissions::new(journal.clone())),
			subscriptions: Arc::new(FakeSubscriptions::new(journal.clone())),
			backend: Arc::new(FakeBackend::new(journal.clone())),
			prompts: Arc::new(FakePrompts::new(journal.clone())),
			widgets: Arc::new(FakeWidgets::new(journal.clone())),
			service_worker: Arc::new(FakeServiceWorker::new(journal.clone())),
			sync: Arc::new(FakeSync::new(journal.clone())),
			port,
			postman,
			display_predicate: None,
			config,
			journal,
		}
	}

	/// Direct integration on a secure top-level page.
	pub fn direct() -> Self {
		Self::new(SdkConfig::new("app-1"), WindowContext::top(SITE))
	}

	/// Direct integration on an http page.
	pub fn insecure() -> Self {
		Self::new(SdkConfig::new("app-1"), WindowContext::top(INSECURE_SITE))
	}

	/// Proxied integration, running in the hosting page.
	pub fn proxied_top_frame() -> Self {
		Self::new(SdkConfig::new("app-1").proxied(PROXY_ORIGIN), WindowContext::top(SITE))
	}

	/// Proxied integration, running inside the auxiliary frame.
	pub fn auxiliary_frame() -> Self {
		Self::new(SdkConfig::new("app-1").proxied(PROXY_ORIGIN), WindowContext::embedded(PROXY_FRAME))
	}

	pub fn auxiliary_frame_with_timeout(timeout: Duration) -> Self {
		Self::new(SdkConfig::new("app-1").proxied(PROXY_ORIGIN).with_rpc_timeout(timeout), WindowContext::embedded(PROXY_FRAME))
	}

	pub fn with_display_predicate(mut self, predicate: impl DisplayPredicate + 'static) -> Self {
		self.display_predicate = Some(Arc::new(predicate));
		self
	}

	pub fn host(&self) -> Host {
		Host {
			page: self.page.clone(),
			visibility: self.page.clone(),
			permission_observer: self.page.clone(),
			storage: self.storage.clone(),
			permissions: self.permissions.clone(),
			subscriptions: self.subscriptions.clone(),
			channel: self.postman.clone(),
			backend: self.backend.clone(),
			prompts: self.prompts.clone(),
			widgets: self.widgets.clone(),
			display_predicate: self.display_predicate.clone(),
			service_worker: self.service_worker.clone(),
			sync: self.sync.clone(),
		}
	}

	/// Builds an [`Sdk`] over this host with the current `config`.
	pub fn sdk(&self) -> Result<Arc<Sdk>> {
		Sdk::new(self.config.clone(), self.host())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn journal_orders_entries() {
		let journal = Journal::new();
		journal.record("a.first");
		journal.record("b.second");
		journal.record("a.third");
		assert!(journal.appears_before("a.", "b."));
		assert!(!journal.appears_before("b.", "a."));
		assert!(!journal.appears_before("a.", "missing"));
		assert_eq!(journal.count("a."), 2);
	}

	#[tokio::test]
	async fn port_keeps_separate_views() {
		let port = FakePort::new();
		port.post(serde_json::to_value(FrameMessage::command(0, crate::protocol::FrameCommand::Ping, Value::Null)).unwrap()).unwrap();
		assert_eq!(port.next_sent().await.id, 0);
		assert_eq!(port.take_sent().len(), 1);
		assert!(port.take_sent().is_empty());
	}

	#[test]
	fn port_rejects_non_envelopes() {
		assert!(matches!(FakePort::new().post(Value::Null), Err(Error::Json(_))));
	}
}
