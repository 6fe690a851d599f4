//! Key/value storage abstraction shared by the chat log and voice settings.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use fany_core::error::FanyError;

/// Key under which the conversation log is stored (JSON array of messages).
pub const CHAT_HISTORY_KEY: &str = "fany_chat_history";

/// Key under which the voice settings are stored (JSON object).
pub const VOICE_SETTINGS_KEY: &str = "fany_voice_settings";

/// String-keyed, string-valued persistent storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, FanyError>;
    fn set(&self, key: &str, value: &str) -> Result<(), FanyError>;
    fn remove(&self, key: &str) -> Result<(), FanyError>;
}

/// Volatile store used in tests and when no data directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, FanyError> {
        self.entries
            .lock()
            .map_err(|e| FanyError::Storage(format!("memory store lock poisoned: {}", e)))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, FanyError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FanyError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), FanyError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Read and decode a JSON document. `Ok(None)` when the key is absent.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, FanyError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and write it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), FanyError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
