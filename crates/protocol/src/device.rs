//! Device records sent with backend session updates.

use serde::{Deserialize, Serialize};

/// Kind of identity a session update is recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
	ChromeLike,
	Firefox,
	Safari,
	Edge,
	Email,
}

/// Subscription state reported to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationTypes {
	Subscribed,
	Unsubscribed,
	OptedOut,
}

/// Snapshot of the visitor's device sent on every session update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
	pub app_id: String,
	pub device_type: DeviceType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub language: Option<String>,
	/// Offset from UTC in seconds.
	#[serde(default)]
	pub timezone: i32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sdk_version: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notification_types: Option<NotificationTypes>,
}

impl DeviceRecord {
	/// Copies this record for an email identity.
	pub fn for_email(&self) -> Self {
		Self {
			device_type: DeviceType::Email,
			notification_types: None,
			..self.clone()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn email_record_drops_push_state() {
		let record = DeviceRecord {
			app_id: "app".into(),
			device_type: DeviceType::Firefox,
			language: Some("en".into()),
			timezone: 3600,
			sdk_version: None,
			notification_types: Some(NotificationTypes::Subscribed),
		};
		let email = record.for_email();
		assert_eq!(email.device_type, DeviceType::Email);
		assert_eq!(email.notification_types, None);
		assert_eq!(email.language.as_deref(), Some("en"));
		assert_eq!(email.timezone, 3600);
	}
}
