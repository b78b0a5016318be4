//! Renewal of expiring push subscriptions.
//!
//! The renewal path depends on the integration mode:
//!
//! | Mode / role | Renewal |
//! |-------------|---------|
//! | `DirectSecure` | subscribe a new credential, then register it |
//! | `ProxiedSecure` in the auxiliary frame | ask the top frame for a new subscription and wait for it |
//! | `ProxiedSecure` in the top frame | have the auxiliary frame process the expiring subscription |
//! | `InsecureLegacy` | forget the registration id (soft unsubscribe) |
//!
//! At most one attempt is made per call; nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SdkConfig;
use crate::environment::{Environment, FrameRole, IntegrationMode};
use crate::error::Result;
use crate::frame::{FrameChannel, RemoteCommandHandler};
use crate::host::{Host, SubscribeStrategy, SubscriptionLifecycle};
use crate::protocol::{AppConfigPayload, FrameCommand, RenewalReport, SubscriptionRecord};
use crate::storage::{KeyValueStore, keys, stores};

/// What [`SubscriptionRenewalCoordinator::renew_if_expiring`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RenewalOutcome {
	NotExpiring,
	/// Renewed directly on this origin.
	Renewed { record: SubscriptionRecord },
	/// Received a new subscription from the top frame.
	ReceivedFromTopFrame { record: SubscriptionRecord },
	/// The auxiliary frame processed the expiring subscription.
	Delegated { report: RenewalReport },
	/// The stored registration id was removed.
	SoftUnsubscribed,
}

pub struct SubscriptionRenewalCoordinator {
	subscriptions: Arc<dyn SubscriptionLifecycle>,
	channel: Arc<dyn FrameChannel>,
	storage: Arc<dyn KeyValueStore>,
	app_config: AppConfigPayload,
}

impl SubscriptionRenewalCoordinator {
	pub fn new(host: &Host, config: &SdkConfig) -> Self {
		Self {
			subscriptions: Arc::clone(&host.subscriptions),
			channel: Arc::clone(&host.channel),
			storage: Arc::clone(&host.storage),
			app_config: config.app_config_payload(),
		}
	}

	/// Renews the current subscription if the push service reports it as expiring.
	///
	/// Failures of the direct subscribe or register step are returned to the caller.
	pub async fn renew_if_expiring(&self, environment: Environment) -> Result<RenewalOutcome> {
		if !self.subscriptions.is_subscription_expiring().await? {
			debug!(target = "pushboot.renewal", "subscription not expiring");
			return Ok(RenewalOutcome::NotExpiring);
		}

		info!(target = "pushboot.renewal", mode = ?environment.mode, role = ?environment.role, "renewing expiring subscription");
		match (environment.mode, environment.role) {
			(IntegrationMode::DirectSecure, _) => Ok(RenewalOutcome::Renewed {
				record: self.renew_direct().await?,
			}),
			(IntegrationMode::ProxiedSecure, FrameRole::AuxiliaryFrame) => Ok(RenewalOutcome::ReceivedFromTopFrame {
				record: self.request_from_top_frame().await?,
			}),
			(IntegrationMode::ProxiedSecure, FrameRole::TopFrame) => Ok(RenewalOutcome::Delegated {
				report: self.delegate_to_auxiliary_frame().await?,
			}),
			(IntegrationMode::InsecureLegacy, _) => {
				self.storage.remove(stores::IDS, keys::REGISTRATION_ID).await?;
				info!(target = "pushboot.renewal", "insecure origin cannot renew; registration id removed");
				Ok(RenewalOutcome::SoftUnsubscribed)
			}
		}
	}

	/// Subscribes a new credential and registers it, in that order.
	pub async fn renew_direct(&self) -> Result<SubscriptionRecord> {
		let record = self.subscriptions.subscribe(SubscribeStrategy::SubscribeNew).await?;
		self.subscriptions.register_subscription(&record).await?;
		debug!(target = "pushboot.renewal", endpoint = %record.endpoint, "registered renewed subscription");
		Ok(record)
	}

	async fn request_from_top_frame(&self) -> Result<SubscriptionRecord> {
		let created = self.channel.on_next_message_once(FrameCommand::SubscriptionCreated);
		let payload = serde_json::to_value(&self.app_config)?;
		self.channel.send(FrameCommand::SubscribeNew, payload).await?;

		let record: SubscriptionRecord = serde_json::from_value(created.recv().await?)?;
		debug!(target = "pushboot.renewal", endpoint = %record.endpoint, "received subscription from top frame");
		Ok(record)
	}

	async fn delegate_to_auxiliary_frame(&self) -> Result<RenewalReport> {
		let reply = self.channel.execute_remote_command(FrameCommand::ProcessExpiringSubscriptions, Value::Null).await?;
		let report = if reply.is_null() { RenewalReport::default() } else { serde_json::from_value(reply)? };
		debug!(target = "pushboot.renewal", ?report, "auxiliary frame processed expiring subscription");
		Ok(report)
	}
}

/// Serves [`FrameCommand::ProcessExpiringSubscriptions`] from the auxiliary frame,
/// which sits on the secure origin and can renew directly.
pub struct ExpiringSubscriptionsHandler {
	coordinator: Arc<SubscriptionRenewalCoordinator>,
}

impl ExpiringSubscriptionsHandler {
	pub fn new(coordinator: Arc<SubscriptionRenewalCoordinator>) -> Self {
		Self { coordinator }
	}
}

#[async_trait]
impl RemoteCommandHandler for ExpiringSubscriptionsHandler {
	async fn handle(&self, _payload: Value) -> Result<Value> {
		let expiring = self.coordinator.subscriptions.is_subscription_expiring().await?;
		if expiring {
			self.coordinator.renew_direct().await?;
		}
		Ok(serde_json::to_value(RenewalReport { expiring, renewed: expiring })?)
	}
}
