//! Scenario files for `pushboot simulate`.
//!
//! A scenario scripts every fake collaborator for one page load:
//!
//! ```json
//! {
//!   "config": { "appId": "app-1", "autoRegister": true },
//!   "page": { "location": "https://shop.example.com/", "userAgent": "..." },
//!   "permission": "default",
//!   "expiring": true,
//!   "storage": [{ "store": "Ids", "key": "userId", "value": "user-1" }],
//!   "inbound": [{ "id": 0, "command": "subscription-created", "payload": { "endpoint": "..." } }]
//! }
//! ```
//!
//! `inbound` envelopes are delivered to the postman once the first envelope has
//! been posted, so a reply to the first request uses `"replyTo": 0`.

use std::path::Path;

use anyhow::Context;
use pushboot::fake::{CHROME_DESKTOP_UA, FakeDisplayPredicate, FakeHost};
use pushboot::host::{DisplayDecision, NotificationPermission, SlidedownResponse};
use pushboot::{SdkConfig, WindowContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
	pub config: SdkConfig,
	pub page: PageScenario,
	#[serde(default)]
	pub permission: NotificationPermission,
	#[serde(default)]
	pub push_enabled: bool,
	#[serde(default)]
	pub opted_out: bool,
	#[serde(default)]
	pub expiring: bool,
	#[serde(default)]
	pub already_registered: bool,
	#[serde(default)]
	pub service_worker_active: bool,
	#[serde(default = "granted")]
	pub native_answer: NotificationPermission,
	#[serde(default = "accepted")]
	pub slidedown_answer: SlidedownResponse,
	#[serde(default)]
	pub display_decision: Option<DisplayDecision>,
	#[serde(default)]
	pub storage: Vec<StorageEntry>,
	#[serde(default)]
	pub inbound: Vec<Value>,
	/// Explicit register calls made after initialization.
	#[serde(default)]
	pub register_calls: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageScenario {
	pub location: String,
	#[serde(default)]
	pub embedded: bool,
	#[serde(default)]
	pub user_agent: Option<String>,
	/// Hidden pages become visible as soon as the bootstrap starts waiting.
	#[serde(default = "visible")]
	pub visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
	pub store: String,
	pub key: String,
	pub value: Value,
}

fn granted() -> NotificationPermission {
	NotificationPermission::Granted
}

fn accepted() -> SlidedownResponse {
	SlidedownResponse::Accepted
}

fn visible() -> bool {
	true
}

impl Scenario {
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let json = std::fs::read_to_string(path).with_context(|| format!("failed to read scenario {}", path.display()))?;
		let scenario: Self = serde_json::from_str(&json).with_context(|| format!("invalid scenario {}", path.display()))?;
		scenario.config.validate().context("invalid scenario config")?;
		Ok(scenario)
	}

	pub fn window(&self) -> WindowContext {
		WindowContext {
			location: self.page.location.clone(),
			embedded: self.page.embedded,
		}
	}

	/// Builds the fake host scripted by this scenario.
	pub fn host(&self) -> FakeHost {
		let mut fake = FakeHost::new(self.config.clone(), self.window());
		if let Some(decision) = self.display_decision {
			fake = fake.with_display_predicate(FakeDisplayPredicate::new(decision));
		}

		fake.page.set_user_agent(self.page.user_agent.as_deref().unwrap_or(CHROME_DESKTOP_UA));
		fake.page.set_visible_silently(self.page.visible);
		fake.permissions.set_permission(self.permission);
		fake.permissions.set_push_enabled(self.push_enabled);
		fake.permissions.set_opted_out(self.opted_out);
		fake.subscriptions.set_expiring(self.expiring);
		fake.subscriptions.set_already_registered(self.already_registered);
		fake.service_worker.set_active(self.service_worker_active);
		fake.prompts.answer_native(self.native_answer);
		fake.prompts.answer_slidedown(self.slidedown_answer);
		for entry in &self.storage {
			fake.storage.seed(&entry.store, &entry.key, entry.value.clone());
		}
		fake
	}
}
