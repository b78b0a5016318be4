//! Cross-frame request/response layer.
//!
//! The hosting page and the auxiliary frame talk through `postMessage`. This
//! module adds the correlation the raw channel lacks:
//!
//! - sequential message ids and reply correlation by id
//! - one-shot listeners keyed by [`FrameCommand`]
//! - remote command handlers that answer inbound requests
//!
//! Every wait carries an explicit timeout and is cancelled when the postman
//! shuts down.

mod listener;
mod postman;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use listener::{ListenerRegistry, OnceListener};
pub use postman::FramePostman;

use crate::error::Result;
use crate::protocol::FrameCommand;

/// Outbound half of the raw frame channel (`window.postMessage` or equivalent).
pub trait FramePort: Send + Sync {
	fn post(&self, message: Value) -> Result<()>;
}

/// Answers inbound requests for one [`FrameCommand`].
#[async_trait]
pub trait RemoteCommandHandler: Send + Sync {
	async fn handle(&self, payload: Value) -> Result<Value>;
}

/// Command-level channel to the frame on the other side.
#[async_trait]
pub trait FrameChannel: Send + Sync {
	/// Posts a one-way command.
	async fn send(&self, command: FrameCommand, payload: Value) -> Result<()>;

	/// Arms a single-use listener for the next inbound `command`.
	///
	/// The listener is armed when this returns, so a command sent afterwards
	/// cannot race past it.
	fn on_next_message_once(&self, command: FrameCommand) -> OnceListener;

	/// Sends a request and waits for the correlated reply.
	async fn execute_remote_command(&self, command: FrameCommand, payload: Value) -> Result<Value>;

	/// Registers the handler answering inbound `command` requests.
	fn serve(&self, command: FrameCommand, handler: Arc<dyn RemoteCommandHandler>);
}
