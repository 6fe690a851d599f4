//! Loading, saving and shaping the persisted message log.

use fany_core::types::ChatMessage;
use fany_gemini::HistoryTurn;
use fany_storage::{load_json, save_json, KeyValueStore, CHAT_HISTORY_KEY};

use crate::error::ChatError;

/// A log holding only a freshly timestamped welcome message.
pub fn fresh_log() -> Vec<ChatMessage> {
    vec![ChatMessage::welcome()]
}

/// Restore the log from the store.
///
/// Absent, unparsable, non-array or empty data all yield `fresh_log()`.
pub fn load_history(store: &dyn KeyValueStore) -> Vec<ChatMessage> {
    match load_json::<Vec<ChatMessage>>(store, CHAT_HISTORY_KEY) {
        Ok(Some(messages)) if !messages.is_empty() => {
            tracing::debug!(count = messages.len(), "Restored chat history");
            messages
        }
        Ok(_) => fresh_log(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse stored chat history");
            fresh_log()
        }
    }
}

pub fn save_history(store: &dyn KeyValueStore, messages: &[ChatMessage]) -> Result<(), ChatError> {
    save_json(store, CHAT_HISTORY_KEY, messages)?;
    Ok(())
}

/// Prior turns to send with a request: every message except the welcome.
pub fn outgoing_history(messages: &[ChatMessage]) -> Vec<HistoryTurn> {
    messages
        .iter()
        .filter(|m| !m.is_welcome())
        .map(|m| HistoryTurn {
            role: m.role,
            text: m.text.clone(),
        })
        .collect()
}
