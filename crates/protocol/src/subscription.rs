//! Push subscription credentials.

use serde::{Deserialize, Serialize};

/// Push subscription produced by a subscribe call or by the renewal protocol.
///
/// The endpoint is opaque to the bootstrap; the key material is forwarded to
/// the backend untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
	/// Push service endpoint identifying this subscription.
	pub endpoint: String,
	#[serde(default)]
	pub keys: SubscriptionKeys,
	/// Expiration as unix milliseconds, when the push service reports one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiration_time: Option<u64>,
}

/// Auth material attached to a [`SubscriptionRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionKeys {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub p256dh: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub auth: Option<String>,
}

impl SubscriptionRecord {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			keys: SubscriptionKeys::default(),
			expiration_time: None,
		}
	}

	pub fn with_keys(mut self, p256dh: impl Into<String>, auth: impl Into<String>) -> Self {
		self.keys = SubscriptionKeys {
			p256dh: Some(p256dh.into()),
			auth: Some(auth.into()),
		};
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_without_keys() {
		let record: SubscriptionRecord = serde_json::from_str(r#"{"endpoint": "https://push.example/abc"}"#).unwrap();
		assert_eq!(record, SubscriptionRecord::new("https://push.example/abc"));
	}

	#[test]
	fn keys_use_web_push_names() {
		let record = SubscriptionRecord::new("https://push.example/abc").with_keys("pk", "secret");
		let value = serde_json::to_value(&record).unwrap();
		assert_eq!(value["keys"]["p256dh"], "pk");
		assert_eq!(value["keys"]["auth"], "secret");
		assert!(value.get("expirationTime").is_none());
	}
}
