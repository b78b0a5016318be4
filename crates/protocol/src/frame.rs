//! Cross-frame message envelope and command vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Commands understood by both sides of the frame boundary.
///
/// One-shot listeners and remote command handlers are keyed by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameCommand {
	/// Ask the receiving frame to create a fresh subscription.
	SubscribeNew,
	/// Carries a freshly created [`SubscriptionRecord`](crate::SubscriptionRecord).
	SubscriptionCreated,
	/// Ask the auxiliary frame to renew subscriptions that are about to expire.
	ProcessExpiringSubscriptions,
	/// Liveness check. No handler is registered by default; hosts may serve it.
	Ping,
}

impl FrameCommand {
	/// Wire name of the command.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::SubscribeNew => "subscribe-new",
			Self::SubscriptionCreated => "subscription-created",
			Self::ProcessExpiringSubscriptions => "process-expiring-subscriptions",
			Self::Ping => "ping",
		}
	}
}

impl std::fmt::Display for FrameCommand {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Envelope posted across the frame boundary.
///
/// Requests and one-way commands carry no `replyTo`; replies set `replyTo` to the
/// `id` of the request they answer:
/// ```json
/// { "id": 7, "command": "process-expiring-subscriptions", "payload": null }
/// { "id": 3, "command": "process-expiring-subscriptions", "payload": {"renewed": true}, "replyTo": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMessage {
	/// Sender-local sequential id. 64 bits so a page never reuses one.
	pub id: u64,
	pub command: FrameCommand,
	#[serde(default)]
	pub payload: Value,
	/// Id of the request this message answers.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reply_to: Option<u64>,
	/// Failure reported by the remote handler (replies only).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<RemoteError>,
}

impl FrameMessage {
	/// Builds a request or one-way command.
	pub fn command(id: u64, command: FrameCommand, payload: Value) -> Self {
		Self {
			id,
			command,
			payload,
			reply_to: None,
			error: None,
		}
	}

	/// Builds a successful reply to `request`.
	pub fn reply(id: u64, request: &FrameMessage, payload: Value) -> Self {
		Self {
			id,
			command: request.command,
			payload,
			reply_to: Some(request.id),
			error: None,
		}
	}

	/// Builds a failed reply to `request`.
	pub fn failure(id: u64, request: &FrameMessage, message: impl Into<String>) -> Self {
		Self {
			id,
			command: request.command,
			payload: Value::Null,
			reply_to: Some(request.id),
			error: Some(RemoteError { message: message.into() }),
		}
	}

	pub fn is_reply(&self) -> bool {
		self.reply_to.is_some()
	}
}

/// Error details carried by a failed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
	pub message: String,
}

/// Application configuration echoed to the top frame with [`FrameCommand::SubscribeNew`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfigPayload {
	pub app_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub proxy_origin: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sdk_version: Option<String>,
}

/// Result posted back for [`FrameCommand::ProcessExpiringSubscriptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalReport {
	/// Whether the subscription was expiring when the command arrived.
	pub expiring: bool,
	/// Whether a new subscription was created and registered.
	pub renewed: bool,
}
