//! Post-initialization sequence, run once per page after the first session bootstrap.
//!
//! Steps run strictly in order; the permission-change hook computes deltas
//! against the baseline, so the baseline must be captured first. Apart from
//! direct-mode renewal, every step is best effort.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::Sdk;
use crate::SDK_VERSION;
use crate::context::Baseline;
use crate::environment::{Environment, IntegrationMode};
use crate::error::Result;
use crate::events::SdkEvent;
use crate::host::{DisplayDecision, NotificationPermission, WidgetVisibility};
use crate::prompt::BrowserVendor;
use crate::protocol::{DeviceRecord, DeviceType, FrameCommand, NotificationTypes};
use crate::renewal::{ExpiringSubscriptionsHandler, RenewalOutcome};
use crate::storage::{self, keys, stores};

impl Sdk {
	pub(crate) async fn on_sdk_initialized(&self) -> Result<()> {
		let environment = self.environment();
		debug!(target = "pushboot.init", mode = ?environment.mode, role = ?environment.role, "running post-initialization sequence");

		let baseline = self.capture_baseline().await;
		self.install_permission_hook();
		self.apply_welcome_notification_flag(baseline).await;
		self.connect_worker(environment).await;
		self.renew_expiring_subscription(environment).await?;
		self.show_notify_button(environment).await;
		if !environment.is_auxiliary() {
			self.sync_sessions().await;
			if let Err(err) = self.host.sync.install(self.config.session_sync_interval()) {
				warn!(target = "pushboot.init", error = %err, "failed to install session sync job");
			}
		}

		self.context.initialized().raise();
		self.context.emit(SdkEvent::Initialized);
		info!(target = "pushboot.init", "initialized");
		Ok(())
	}

	async fn capture_baseline(&self) -> Baseline {
		let baseline = match self.read_baseline().await {
			Ok(baseline) => baseline,
			Err(err) => {
				warn!(target = "pushboot.init", error = %err, "failed to read baseline; assuming defaults");
				Baseline::default()
			}
		};
		debug!(target = "pushboot.init", ?baseline, "captured baseline");
		self.context.capture_baseline(baseline);
		baseline
	}

	async fn read_baseline(&self) -> Result<Baseline> {
		let permissions = &self.host.permissions;
		Ok(Baseline {
			push_enabled: permissions.is_push_enabled().await?,
			permission: permissions.notification_permission(&self.config.app_id).await?,
			opted_out: permissions.is_opted_out().await?,
		})
	}

	fn install_permission_hook(&self) {
		let context = Arc::clone(&self.context);
		self.context
			.permission_hook
			.install_if_supported(self.host.permission_observer.as_ref(), &self.browser, move |permission| {
				context.record_permission_change(permission);
			});
	}

	async fn apply_welcome_notification_flag(&self, baseline: Baseline) {
		if baseline.permission != NotificationPermission::Granted {
			return;
		}
		self.context.set_skip_welcome_notification();
		if let Err(err) = self.host.storage.put(stores::OPTIONS, keys::SKIP_WELCOME_NOTIFICATION, Value::Bool(true)).await {
			warn!(target = "pushboot.init", error = %err, "failed to persist welcome-notification flag");
		}
	}

	/// Serves renewal requests in the auxiliary frame; elsewhere opens a channel to an active worker.
	async fn connect_worker(&self, environment: Environment) {
		if environment.is_auxiliary() {
			let handler = ExpiringSubscriptionsHandler::new(Arc::clone(&self.renewal));
			self.host.channel.serve(FrameCommand::ProcessExpiringSubscriptions, Arc::new(handler));
			debug!(target = "pushboot.init", "serving expiring-subscription requests");
			return;
		}
		if environment.mode == IntegrationMode::InsecureLegacy {
			return;
		}

		let worker = &self.host.service_worker;
		let result = match worker.has_active_worker().await {
			Ok(true) => worker.establish_channel().await,
			Ok(false) => {
				debug!(target = "pushboot.init", "no active service worker");
				Ok(())
			}
			Err(err) => Err(err),
		};
		if let Err(err) = result {
			warn!(target = "pushboot.init", error = %err, "failed to establish service worker channel");
		}
	}

	/// Direct-mode subscribe and register failures propagate; other renewal failures are logged.
	async fn renew_expiring_subscription(&self, environment: Environment) -> Result<()> {
		match self.renewal.renew_if_expiring(environment).await {
			Ok(RenewalOutcome::NotExpiring) => Ok(()),
			Ok(outcome) => {
				self.context.emit(SdkEvent::SubscriptionRenewed { outcome });
				Ok(())
			}
			Err(err) if environment.mode == IntegrationMode::DirectSecure => Err(err),
			Err(err) => {
				warn!(target = "pushboot.renewal", mode = ?environment.mode, error = %err, "subscription renewal failed");
				Ok(())
			}
		}
	}

	async fn show_notify_button(&self, environment: Environment) {
		if !self.config.notify_button.enable || environment.is_auxiliary() {
			return;
		}

		let decision = match self.host.display_predicate.as_ref().map(|predicate| predicate.evaluate()) {
			None => DisplayDecision::Show,
			Some(Ok(decision)) => decision,
			Some(Err(err)) => {
				warn!(target = "pushboot.init", error = %err, "display predicate failed; hiding notify button");
				DisplayDecision::Hide
			}
		};
		let visibility = match decision {
			DisplayDecision::Show => WidgetVisibility::Visible,
			DisplayDecision::Defer => WidgetVisibility::Hidden,
			DisplayDecision::Hide => {
				debug!(target = "pushboot.init", "notify button hidden by display predicate");
				return;
			}
		};

		if let Err(err) = self.host.widgets.create_notify_button(visibility).await {
			warn!(target = "pushboot.init", error = %err, "failed to create notify button");
		}
	}

	/// Updates backend session counters for the push identity, then for the email identity.
	async fn sync_sessions(&self) {
		let device = self.device_record();
		let storage = self.host.storage.as_ref();

		for (key, device) in [(keys::USER_ID, device.clone()), (keys::EMAIL_ID, device.for_email())] {
			let identity = match storage::get_string(storage, stores::IDS, key).await {
				Ok(Some(identity)) => identity,
				Ok(None) => {
					debug!(target = "pushboot.init", key, "no identity stored; skipping session update");
					continue;
				}
				Err(err) => {
					warn!(target = "pushboot.init", key, error = %err, "failed to read identity");
					continue;
				}
			};
			match self.host.backend.update_user_session(&identity, &device).await {
				Ok(()) => debug!(target = "pushboot.init", key, identity = %identity, "session updated"),
				Err(err) => warn!(target = "pushboot.init", key, identity = %identity, error = %err, "session update failed"),
			}
		}
	}

	pub(crate) fn device_record(&self) -> DeviceRecord {
		let baseline = self.context.baseline().unwrap_or_default();
		let notification_types = if baseline.opted_out {
			NotificationTypes::OptedOut
		} else if baseline.push_enabled {
			NotificationTypes::Subscribed
		} else {
			NotificationTypes::Unsubscribed
		};

		DeviceRecord {
			app_id: self.config.app_id.clone(),
			device_type: match self.browser.vendor {
				BrowserVendor::Firefox => DeviceType::Firefox,
				BrowserVendor::Safari => DeviceType::Safari,
				BrowserVendor::Edge => DeviceType::Edge,
				BrowserVendor::Chrome | BrowserVendor::Opera | BrowserVendor::Other => DeviceType::ChromeLike,
			},
			language: self.host.page.language(),
			timezone: self.host.page.timezone_offset_secs(),
			sdk_version: Some(self.config.sdk_version.clone().unwrap_or_else(|| SDK_VERSION.to_string())),
			notification_types: Some(notification_types),
		}
	}
}
