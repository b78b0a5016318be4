//! Integration-mode and frame-role classification.
//!
//! Classification is a pure function of the declared [`IntegrationKind`] and the
//! current [`WindowContext`]. It is never cached: the top document and an
//! auxiliary frame loaded later in the same session classify differently.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::{IntegrationKind, SdkConfig};

/// Privilege tier the current origin has for subscription operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationMode {
	/// The origin subscribes and registers directly.
	DirectSecure,
	/// Privileged calls are proxied through the auxiliary frame.
	ProxiedSecure,
	/// Insecure origin; only the legacy compatibility path is available.
	InsecureLegacy,
}

/// Whether code runs in the hosting page or in the auxiliary frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameRole {
	TopFrame,
	AuxiliaryFrame,
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
	pub mode: IntegrationMode,
	pub role: FrameRole,
}

impl Environment {
	pub fn is_auxiliary(&self) -> bool {
		self.role == FrameRole::AuxiliaryFrame
	}
}

/// Window facts the classifier needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowContext {
	/// Location of the current document.
	pub location: String,
	/// Whether the document is embedded in another window (`window !== window.top`).
	#[serde(default)]
	pub embedded: bool,
}

impl WindowContext {
	pub fn top(location: impl Into<String>) -> Self {
		Self {
			location: location.into(),
			embedded: false,
		}
	}

	pub fn embedded(location: impl Into<String>) -> Self {
		Self {
			location: location.into(),
			embedded: true,
		}
	}
}

/// Determines the integration mode and frame role for this document.
pub fn classify(config: &SdkConfig, window: &WindowContext) -> Environment {
	let location = Url::parse(&window.location).ok();
	if location.is_none() {
		debug!(target = "pushboot.env", location = %window.location, "unparseable location; treating as insecure");
	}

	let role = match (&location, config.integration, config.proxy_url()) {
		(Some(location), IntegrationKind::Proxied, Some(proxy)) if window.embedded && location.origin() == proxy.origin() => FrameRole::AuxiliaryFrame,
		_ => FrameRole::TopFrame,
	};

	let mode = match role {
		FrameRole::AuxiliaryFrame => IntegrationMode::ProxiedSecure,
		FrameRole::TopFrame => {
			let secure = location.as_ref().is_some_and(|url| is_secure_origin(url, config.allow_localhost_as_secure_origin));
			match (secure, config.integration) {
				(false, _) => IntegrationMode::InsecureLegacy,
				(true, IntegrationKind::Proxied) => IntegrationMode::ProxiedSecure,
				(true, IntegrationKind::Direct) => IntegrationMode::DirectSecure,
			}
		}
	};

	let environment = Environment { mode, role };
	debug!(target = "pushboot.env", ?mode, ?role, embedded = window.embedded, "classified environment");
	environment
}

/// Returns `true` when `url` may use privileged push APIs.
pub fn is_secure_origin(url: &Url, allow_localhost: bool) -> bool {
	match url.scheme() {
		"https" => true,
		"http" if allow_localhost => matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")),
		_ => false,
	}
}

/// [`is_secure_origin`] for an unparsed location; unparseable locations are insecure.
pub fn is_secure_location(location: &str, allow_localhost: bool) -> bool {
	Url::parse(location).is_ok_and(|url| is_secure_origin(&url, allow_localhost))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn proxied() -> SdkConfig {
		SdkConfig::new("app").proxied("https://proxy.example.com")
	}

	#[test]
	fn https_direct_is_direct_secure_top_frame() {
		let env = classify(&SdkConfig::new("app"), &WindowContext::top("https://shop.example.com/cart"));
		assert_eq!(env.mode, IntegrationMode::DirectSecure);
		assert_eq!(env.role, FrameRole::TopFrame);
	}

	#[test]
	fn http_page_is_insecure_legacy_regardless_of_kind() {
		let window = WindowContext::top("http://shop.example.com/");
		assert_eq!(classify(&SdkConfig::new("app"), &window).mode, IntegrationMode::InsecureLegacy);
		assert_eq!(classify(&proxied(), &window).mode, IntegrationMode::InsecureLegacy);
	}

	#[test]
	fn https_proxied_top_frame_is_proxied_secure() {
		let env = classify(&proxied(), &WindowContext::top("https://shop.example.com/"));
		assert_eq!(env, Environment {
			mode: IntegrationMode::ProxiedSecure,
			role: FrameRole::TopFrame,
		});
	}

	#[test]
	fn embedded_proxy_origin_is_auxiliary_frame() {
		let env = classify(&proxied(), &WindowContext::embedded("https://proxy.example.com/frame?session=1"));
		assert_eq!(env.mode, IntegrationMode::ProxiedSecure);
		assert_eq!(env.role, FrameRole::AuxiliaryFrame);
		assert!(env.is_auxiliary());
	}

	#[test]
	fn embedded_third_party_page_stays_top_frame() {
		let env = classify(&proxied(), &WindowContext::embedded("https://widgets.example.org/"));
		assert_eq!(env.role, FrameRole::TopFrame);
	}

	#[test]
	fn proxy_origin_loaded_as_top_level_is_not_auxiliary() {
		let env = classify(&proxied(), &WindowContext::top("https://proxy.example.com/"));
		assert_eq!(env.role, FrameRole::TopFrame);
	}

	#[test]
	fn localhost_requires_opt_in() {
		let window = WindowContext::top("http://localhost:8080/");
		assert_eq!(classify(&SdkConfig::new("app"), &window).mode, IntegrationMode::InsecureLegacy);

		let mut config = SdkConfig::new("app");
		config.allow_localhost_as_secure_origin = true;
		assert_eq!(classify(&config, &window).mode, IntegrationMode::DirectSecure);
	}

	#[test]
	fn garbage_location_is_insecure() {
		let env = classify(&SdkConfig::new("app"), &WindowContext::top("::::"));
		assert_eq!(env.mode, IntegrationMode::InsecureLegacy);
	}

	#[test]
	fn unparsed_location_security() {
		assert!(!is_secure_location("not a url", true));
		assert!(is_secure_location("https://a.example/", false));
	}
}
