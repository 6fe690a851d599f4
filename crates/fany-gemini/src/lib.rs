//! Client for the hosted Gemini generative-language service.
//!
//! The `LanguageModel` trait is the seam the chat session talks to; the
//! `GeminiClient` implementation builds the persona instruction, picks the
//! model for the requested mode and turns every failure into a fixed reply.

pub mod client;
pub mod error;
pub mod instruction;
pub mod types;

use async_trait::async_trait;

pub use client::GeminiClient;
pub use error::GeminiError;
pub use instruction::build_system_instruction;
pub use types::{HistoryTurn, ModelReply, ModelRequest};

/// A conversational model that answers one message given prior turns.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, GeminiError>;
}
