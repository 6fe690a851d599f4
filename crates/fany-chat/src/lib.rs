//! Chat session management for Fany.
//!
//! Keeps the ordered message log, talks to the language model one request at
//! a time, persists the log after every change and speaks replies when live
//! mode is on.

pub mod error;
pub mod history;
pub mod session;

pub use error::ChatError;
pub use history::{fresh_log, load_history, outgoing_history, save_history};
pub use session::{ChatSession, SendOutcome, PROCESSING_ERROR_REPLY};
