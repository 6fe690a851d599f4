pub mod config;
pub mod error;
pub mod knowledge;
pub mod types;

pub use config::FanyConfig;
pub use error::{FanyError, Result};
pub use knowledge::{CategoryFilter, KnowledgeBase, KnowledgeItem};
pub use types::*;
