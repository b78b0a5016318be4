//! Key/value persistence seam and an in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;

/// Store names.
pub mod stores {
	pub const IDS: &str = "Ids";
	pub const OPTIONS: &str = "Options";
	/// Cleared when the browsing session ends.
	pub const SESSION: &str = "Session";
}

/// Keys within [`stores`].
pub mod keys {
	pub const REGISTRATION_ID: &str = "registrationId";
	pub const USER_ID: &str = "userId";
	pub const EMAIL_ID: &str = "emailId";
	pub const SKIP_WELCOME_NOTIFICATION: &str = "skipWelcomeNotification";
	pub const PROMPT_SHOWN: &str = "promptShown";
}

/// Persistent key/value storage grouped into named stores.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
	async fn get(&self, store: &str, key: &str) -> Result<Option<Value>>;
	async fn put(&self, store: &str, key: &str, value: Value) -> Result<()>;
	async fn remove(&self, store: &str, key: &str) -> Result<()>;
}

/// Reads a string value, ignoring values of other types.
pub async fn get_string(storage: &dyn KeyValueStore, store: &str, key: &str) -> Result<Option<String>> {
	Ok(storage.get(store, key).await?.and_then(|value| value.as_str().map(str::to_owned)))
}

/// Reads a boolean value; anything missing or non-boolean is `false`.
pub async fn get_flag(storage: &dyn KeyValueStore, store: &str, key: &str) -> Result<bool> {
	Ok(storage.get(store, key).await?.and_then(|value| value.as_bool()).unwrap_or(false))
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Synchronous read for inspection outside async code.
	pub fn snapshot(&self, store: &str, key: &str) -> Option<Value> {
		self.entries.lock().get(&(store.to_string(), key.to_string())).cloned()
	}

	/// Synchronous write used to seed state.
	pub fn seed(&self, store: &str, key: &str, value: Value) {
		self.entries.lock().insert((store.to_string(), key.to_string()), value);
	}
}

#[async_trait]
impl KeyValueStore for MemoryStore {
	async fn get(&self, store: &str, key: &str) -> Result<Option<Value>> {
		Ok(self.snapshot(store, key))
	}

	async fn put(&self, store: &str, key: &str, value: Value) -> Result<()> {
		self.seed(store, key, value);
		Ok(())
	}

	async fn remove(&self, store: &str, key: &str) -> Result<()> {
		self.entries.lock().remove(&(store.to_string(), key.to_string()));
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[tokio::test]
	async fn put_get_remove() {
		let store = MemoryStore::new();
		store.put(stores::IDS, keys::USER_ID, json!("user-1")).await.unwrap();
		assert_eq!(get_string(&store, stores::IDS, keys::USER_ID).await.unwrap().as_deref(), Some("user-1"));

		store.remove(stores::IDS, keys::USER_ID).await.unwrap();
		assert_eq!(store.get(stores::IDS, keys::USER_ID).await.unwrap(), None);
	}

	#[tokio::test]
	async fn stores_are_namespaced() {
		let store = MemoryStore::new();
		store.seed(stores::SESSION, keys::PROMPT_SHOWN, json!(true));
		assert!(get_flag(&store, stores::SESSION, keys::PROMPT_SHOWN).await.unwrap());
		assert!(!get_flag(&store, stores::OPTIONS, keys::PROMPT_SHOWN).await.unwrap());
	}

	#[tokio::test]
	async fn typed_reads_ignore_wrong_types() {
		let store = MemoryStore::new();
		store.seed(stores::IDS, keys::USER_ID, json!(42));
		store.seed(stores::OPTIONS, keys::SKIP_WELCOME_NOTIFICATION, json!("yes"));
		assert_eq!(get_string(&store, stores::IDS, keys::USER_ID).await.unwrap(), None);
		assert!(!get_flag(&store, stores::OPTIONS, keys::SKIP_WELCOME_NOTIFICATION).await.unwrap());
	}
}
