//! Message-id correlation on top of a [`FramePort`].
//!
//! # Message Flow
//!
//! 1. Caller invokes `execute_remote_command()` with a command and payload
//! 2. Postman allocates the next id and parks a oneshot sender under it
//! 3. The envelope is serialized and posted through the port
//! 4. The inbound loop hands every received envelope to `dispatch()`
//! 5. Replies (`replyTo` set) complete the parked sender for that id
//! 6. Other envelopes go to the oldest armed one-shot listener for the command,
//!    or else to the registered handler, whose result is posted back as a reply

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::listener::{ListenerRegistry, OnceListener};
use super::{FrameChannel, FramePort, RemoteCommandHandler};
use crate::error::{Error, Result};
use crate::protocol::{FrameCommand, FrameMessage};

/// Correlating endpoint of the cross-frame channel.
///
/// Share it behind an `Arc`; inbound envelopes are fed through
/// [`run`](Self::run) or [`dispatch`](Self::dispatch).
pub struct FramePostman {
	/// Sequential id counter for outbound envelopes
	last_id: AtomicU64,
	/// Pending request callbacks keyed by envelope id
	replies: Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>,
	listeners: Arc<ListenerRegistry>,
	handlers: Mutex<HashMap<FrameCommand, Arc<dyn RemoteCommandHandler>>>,
	port: Arc<dyn FramePort>,
	timeout: Duration,
	cancel: CancellationToken,
}

impl FramePostman {
	pub fn new(port: Arc<dyn FramePort>, timeout: Duration) -> Arc<Self> {
		Arc::new(Self {
			last_id: AtomicU64::new(0),
			replies: Mutex::new(HashMap::new()),
			listeners: ListenerRegistry::new(),
			handlers: Mutex::new(HashMap::new()),
			port,
			timeout,
			cancel: CancellationToken::new(),
		})
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Listener registry, exposed for inspection.
	pub fn listeners(&self) -> &ListenerRegistry {
		&self.listeners
	}

	/// Number of requests still waiting for a reply.
	pub fn pending_replies(&self) -> usize {
		self.replies.lock().len()
	}

	/// Cancels every pending wait; used on page teardown.
	pub fn shutdown(&self) {
		self.cancel.cancel();
	}

	/// Feeds inbound envelopes to [`dispatch`](Self::dispatch) until the channel
	/// closes or the postman shuts down.
	pub async fn run(self: Arc<Self>, mut inbound: mpsc::UnboundedReceiver<Value>) {
		loop {
			let message = tokio::select! {
				message = inbound.recv() => message,
				_ = self.cancel.cancelled() => None,
			};
			let Some(message) = message else {
				break;
			};
			if let Err(err) = self.dispatch(message) {
				error!(target = "pushboot.frame", error = %err, "failed to dispatch frame message");
			}
		}
		debug!(target = "pushboot.frame", "frame message loop ended");
	}

	/// Routes one inbound envelope.
	///
	/// # Errors
	///
	/// Returns error if:
	/// - The value is not a frame envelope
	/// - A reply names a request id that is not pending
	pub fn dispatch(self: &Arc<Self>, raw: Value) -> Result<()> {
		let mut message: FrameMessage = serde_json::from_value(raw)?;

		if let Some(request_id) = message.reply_to {
			let callback = self
				.replies
				.lock()
				.remove(&request_id)
				.ok_or_else(|| Error::Protocol(format!("Cannot find request to respond: id={request_id}")))?;

			let result = match message.error {
				Some(remote) => Err(Error::Remote(remote.message)),
				None => Ok(message.payload),
			};
			// the requester may have timed out already
			let _ = callback.send(result);
			return Ok(());
		}

		let payload = match self.listeners.deliver(message.command, std::mem::take(&mut message.payload)) {
			Ok(()) => {
				debug!(target = "pushboot.frame", command = %message.command, id = message.id, "delivered to one-shot listener");
				return Ok(());
			}
			Err(payload) => payload,
		};

		let handler = self.handlers.lock().get(&message.command).cloned();
		let Some(handler) = handler else {
			debug!(target = "pushboot.frame", command = %message.command, id = message.id, "no listener or handler; dropping message");
			return Ok(());
		};

		let postman = Arc::clone(self);
		tokio::spawn(async move {
			let reply = match handler.handle(payload).await {
				Ok(result) => FrameMessage::reply(postman.next_id(), &message, result),
				Err(err) => {
					warn!(target = "pushboot.frame", command = %message.command, error = %err, "remote command handler failed");
					FrameMessage::failure(postman.next_id(), &message, err.to_string())
				}
			};
			if let Err(err) = postman.post(&reply) {
				warn!(target = "pushboot.frame", command = %reply.command, error = %err, "failed to post reply");
			}
		});
		Ok(())
	}

	fn next_id(&self) -> u64 {
		self.last_id.fetch_add(1, Ordering::SeqCst)
	}

	fn post(&self, message: &FrameMessage) -> Result<()> {
		let value = serde_json::to_value(message)?;
		self.port.post(value)
	}
}

#[async_trait]
impl FrameChannel for FramePostman {
	async fn send(&self, command: FrameCommand, payload: Value) -> Result<()> {
		let message = FrameMessage::command(self.next_id(), command, payload);
		debug!(target = "pushboot.frame", %command, id = message.id, "posting command");
		self.post(&message)
	}

	fn on_next_message_once(&self, command: FrameCommand) -> OnceListener {
		self.listeners.arm(command, self.timeout, self.cancel.child_token())
	}

	async fn execute_remote_command(&self, command: FrameCommand, payload: Value) -> Result<Value> {
		let id = self.next_id();
		let (tx, rx) = oneshot::channel();
		self.replies.lock().insert(id, tx);

		if let Err(err) = self.post(&FrameMessage::command(id, command, payload)) {
			self.replies.lock().remove(&id);
			return Err(err);
		}
		debug!(target = "pushboot.frame", %command, id, "awaiting remote command reply");

		let timeout = self.timeout;
		let result = tokio::select! {
			reply = rx => reply.map_err(|_| Error::ChannelClosed).and_then(|result| result),
			_ = tokio::time::sleep(timeout) => Err(Error::Timeout(format!("no reply to {command} within {timeout:?}"))),
			_ = self.cancel.cancelled() => Err(Error::Cancelled),
		};

		if result.is_err() {
			self.replies.lock().remove(&id);
		}
		result
	}

	fn serve(&self, command: FrameCommand, handler: Arc<dyn RemoteCommandHandler>) {
		if self.handlers.lock().insert(command, handler).is_some() {
			debug!(target = "pushboot.frame", %command, "replaced remote command handler");
		}
	}
}
