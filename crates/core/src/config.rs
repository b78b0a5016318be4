//! SDK configuration as supplied by the embedding page.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::DEFAULT_RPC_TIMEOUT_MS;
use crate::error::{Error, Result};
use crate::protocol::AppConfigPayload;

const DEFAULT_SESSION_SYNC_INTERVAL_SECS: u64 = 300;

/// Integration kind declared by the site owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationKind {
	/// The site origin registers the service worker itself.
	#[default]
	Direct,
	/// Privileged calls go through an auxiliary frame on `proxyOrigin`.
	Proxied,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
	/// Explicit register calls open the full-screen modal instead of the native prompt.
	#[serde(default)]
	pub modal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyButtonOptions {
	#[serde(default)]
	pub enable: bool,
}

/// Configuration for one page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
	pub app_id: String,
	#[serde(default)]
	pub integration: IntegrationKind,
	/// Origin hosting the auxiliary frame for [`IntegrationKind::Proxied`].
	#[serde(default)]
	pub proxy_origin: Option<String>,
	#[serde(default)]
	pub allow_localhost_as_secure_origin: bool,
	#[serde(default)]
	pub auto_register: bool,
	#[serde(default)]
	pub auto_resubscribe: bool,
	#[serde(default)]
	pub prompt_options: PromptOptions,
	#[serde(default)]
	pub notify_button: NotifyButtonOptions,
	#[serde(default = "default_rpc_timeout_ms")]
	pub rpc_timeout_ms: u64,
	#[serde(default = "default_session_sync_interval_secs")]
	pub session_sync_interval_secs: u64,
	#[serde(default)]
	pub sdk_version: Option<String>,
}

fn default_rpc_timeout_ms() -> u64 {
	DEFAULT_RPC_TIMEOUT_MS
}

fn default_session_sync_interval_secs() -> u64 {
	DEFAULT_SESSION_SYNC_INTERVAL_SECS
}

impl SdkConfig {
	pub fn new(app_id: impl Into<String>) -> Self {
		Self {
			app_id: app_id.into(),
			integration: IntegrationKind::Direct,
			proxy_origin: None,
			allow_localhost_as_secure_origin: false,
			auto_register: false,
			auto_resubscribe: false,
			prompt_options: PromptOptions::default(),
			notify_button: NotifyButtonOptions::default(),
			rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
			session_sync_interval_secs: DEFAULT_SESSION_SYNC_INTERVAL_SECS,
			sdk_version: None,
		}
	}

	/// Switches to the proxied integration served from `origin`.
	pub fn proxied(mut self, origin: impl Into<String>) -> Self {
		self.integration = IntegrationKind::Proxied;
		self.proxy_origin = Some(origin.into());
		self
	}

	pub fn with_auto_register(mut self, auto_register: bool) -> Self {
		self.auto_register = auto_register;
		self
	}

	pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
		self.rpc_timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
		self
	}

	/// Parses and validates a JSON config document.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and validates a JSON config file.
	pub fn load(path: &Path) -> Result<Self> {
		let json = std::fs::read_to_string(path)?;
		Self::from_json(&json)
	}

	pub fn validate(&self) -> Result<()> {
		if self.app_id.trim().is_empty() {
			return Err(Error::Config("appId must not be empty".into()));
		}
		if self.rpc_timeout_ms == 0 {
			return Err(Error::Config("rpcTimeoutMs must be greater than zero".into()));
		}
		if self.integration == IntegrationKind::Proxied {
			let Some(origin) = self.proxy_origin.as_deref() else {
				return Err(Error::Config("proxied integration requires proxyOrigin".into()));
			};
			Url::parse(origin).map_err(|err| Error::Config(format!("proxyOrigin {origin:?} is not a valid URL: {err}")))?;
		}
		Ok(())
	}

	/// Parsed proxy origin, if one is configured and valid.
	pub fn proxy_url(&self) -> Option<Url> {
		self.proxy_origin.as_deref().and_then(|origin| Url::parse(origin).ok())
	}

	pub fn rpc_timeout(&self) -> Duration {
		Duration::from_millis(self.rpc_timeout_ms)
	}

	pub fn session_sync_interval(&self) -> Duration {
		Duration::from_secs(self.session_sync_interval_secs)
	}

	/// Payload sent with [`FrameCommand::SubscribeNew`](crate::protocol::FrameCommand::SubscribeNew).
	pub fn app_config_payload(&self) -> AppConfigPayload {
		AppConfigPayload {
			app_id: self.app_id.clone(),
			proxy_origin: self.proxy_origin.clone(),
			sdk_version: self.sdk_version.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn minimal_json_fills_defaults() {
		let config = SdkConfig::from_json(r#"{"appId": "app-1"}"#).unwrap();
		assert_eq!(config.integration, IntegrationKind::Direct);
		assert_eq!(config.rpc_timeout_ms, DEFAULT_RPC_TIMEOUT_MS);
		assert_eq!(config.session_sync_interval(), Duration::from_secs(300));
		assert!(!config.auto_register);
		assert!(!config.notify_button.enable);
	}

	#[test]
	fn proxied_without_origin_is_rejected() {
		let err = SdkConfig::from_json(r#"{"appId": "app-1", "integration": "proxied"}"#).unwrap_err();
		assert!(matches!(err, Error::Config(msg) if msg.contains("proxyOrigin")));
	}

	#[test]
	fn proxied_with_garbage_origin_is_rejected() {
		let err = SdkConfig::from_json(r#"{"appId": "app-1", "integration": "proxied", "proxyOrigin": "not a url"}"#).unwrap_err();
		assert!(matches!(err, Error::Config(_)));
	}

	#[test]
	fn empty_app_id_is_rejected() {
		assert!(matches!(SdkConfig::from_json(r#"{"appId": "  "}"#), Err(Error::Config(_))));
	}

	#[test]
	fn zero_timeout_is_rejected() {
		assert!(SdkConfig::new("app").with_rpc_timeout(Duration::ZERO).validate().is_err());
	}

	#[test]
	fn app_config_payload_echoes_identity() {
		let config = SdkConfig::new("app-1").proxied("https://proxy.example.com");
		let payload = config.app_config_payload();
		assert_eq!(payload.app_id, "app-1");
		assert_eq!(payload.proxy_origin.as_deref(), Some("https://proxy.example.com"));
	}
}
