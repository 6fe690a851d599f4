//! Request/response types: the provider-neutral pair exchanged with the chat
//! session, and the `generateContent` wire format.

use serde::Serialize;

use fany_core::types::{Role, Source};

/// One prior conversation turn sent as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

/// Everything needed to produce one reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRequest {
    /// The new user message.
    pub message: String,
    /// Prior turns, oldest first, without the synthetic greeting.
    pub history: Vec<HistoryTurn>,
    /// Terse voice-call style.
    pub live_mode: bool,
    /// Ground the answer with web search.
    pub web_search: bool,
}

/// Reply text plus citations, when the service returned any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub sources: Option<Vec<Source>>,
}

impl ModelReply {
    /// A reply without citations.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
        }
    }
}

// =============================================================================
// Wire format
// =============================================================================

/// Body of `POST /v1beta/models/{model}:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn system(text: String) -> Self {
        Self {
            role: None,
            parts: vec![Part { text }],
        }
    }

    pub fn turn(role: Role, text: String) -> Self {
        Self {
            role: Some(role.as_str()),
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
}

/// Tool declaration. Only web search grounding is used.
#[derive(Debug, Serialize)]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Default, Serialize)]
pub struct GoogleSearch {}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: GoogleSearch::default(),
        }
    }
}
