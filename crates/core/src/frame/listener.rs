//! Single-use listeners keyed by command.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::protocol::FrameCommand;

type Slot = (u64, oneshot::Sender<Value>);

/// Armed one-shot listeners. Delivery is FIFO per command.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
	next_id: AtomicU64,
	slots: Mutex<HashMap<FrameCommand, VecDeque<Slot>>>,
}

impl ListenerRegistry {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Arms a listener that gives up after `timeout` or when `cancel` fires.
	pub fn arm(self: &Arc<Self>, command: FrameCommand, timeout: Duration, cancel: CancellationToken) -> OnceListener {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let (tx, rx) = oneshot::channel();
		self.slots.lock().entry(command).or_default().push_back((id, tx));
		OnceListener {
			command,
			id,
			rx,
			registry: Arc::downgrade(self),
			timeout,
			cancel,
		}
	}

	/// Hands `payload` to the oldest live listener for `command`.
	///
	/// Gives the payload back when nobody is listening.
	pub fn deliver(&self, command: FrameCommand, payload: Value) -> std::result::Result<(), Value> {
		let mut slots = self.slots.lock();
		let Some(queue) = slots.get_mut(&command) else {
			return Err(payload);
		};

		let mut payload = payload;
		let mut delivered = false;
		while let Some((_, tx)) = queue.pop_front() {
			match tx.send(payload) {
				Ok(()) => {
					delivered = true;
					payload = Value::Null;
					break;
				}
				Err(returned) => payload = returned,
			}
		}
		if queue.is_empty() {
			slots.remove(&command);
		}

		if delivered { Ok(()) } else { Err(payload) }
	}

	/// Number of listeners currently armed for `command`.
	pub fn armed(&self, command: FrameCommand) -> usize {
		self.slots.lock().get(&command).map_or(0, VecDeque::len)
	}

	fn disarm(&self, command: FrameCommand, id: u64) {
		let mut slots = self.slots.lock();
		if let Some(queue) = slots.get_mut(&command) {
			queue.retain(|(slot_id, _)| *slot_id != id);
			if queue.is_empty() {
				slots.remove(&command);
			}
		}
	}
}

/// Single-use subscription to the next inbound message for one command.
///
/// Dropping the handle deregisters it, whether or not a message arrived.
#[must_use = "an unawaited listener is deregistered immediately"]
#[derive(Debug)]
pub struct OnceListener {
	command: FrameCommand,
	id: u64,
	rx: oneshot::Receiver<Value>,
	registry: Weak<ListenerRegistry>,
	timeout: Duration,
	cancel: CancellationToken,
}

impl OnceListener {
	pub fn command(&self) -> FrameCommand {
		self.command
	}

	/// Waits for the payload of the next matching message.
	pub async fn recv(mut self) -> Result<Value> {
		let command = self.command;
		let timeout = self.timeout;
		tokio::select! {
			received = &mut self.rx => received.map_err(|_| Error::ChannelClosed),
			_ = tokio::time::sleep(timeout) => Err(Error::Timeout(format!("no {command} message within {timeout:?}"))),
			_ = self.cancel.cancelled() => Err(Error::Cancelled),
		}
	}
}

impl Drop for OnceListener {
	fn drop(&mut self) {
		if let Some(registry) = self.registry.upgrade() {
			registry.disarm(self.command, self.id);
		}
	}
}
