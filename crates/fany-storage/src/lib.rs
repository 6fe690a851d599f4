//! Fany Storage crate - the local key/value store behind chat history and
//! voice settings.
//!
//! Provides a WAL-mode SQLite database with migrations, an in-memory store
//! for tests and hosts without a data directory, and JSON helpers on top of
//! the `KeyValueStore` trait.

pub mod db;
pub mod migrations;
pub mod store;

pub use db::Database;
pub use store::{
    load_json, save_json, KeyValueStore, MemoryStore, CHAT_HISTORY_KEY, VOICE_SETTINGS_KEY,
};
