//! Error types for the Gemini client.

/// Errors from building, sending or decoding a generation request.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("API key not configured")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("knowledge base error: {0}")]
    Knowledge(String),
}

impl From<fany_core::FanyError> for GeminiError {
    fn from(err: fany_core::FanyError) -> Self {
        GeminiError::Knowledge(err.to_string())
    }
}

/// Maximum number of characters from an HTTP error body kept in messages.
const MAX_ERROR_BODY_LEN: usize = 200;

/// Map a non-success HTTP status and body to a `GeminiError::Api`.
pub(crate) fn map_http_error(status: u16, body: &str) -> GeminiError {
    let safe_body = if body.chars().count() > MAX_ERROR_BODY_LEN {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{truncated}…[truncated]")
    } else {
        body.to_string()
    };

    let message = match status {
        401 | 403 => "Unauthorized: check the Gemini API key".to_string(),
        429 => "Rate limited by Gemini API".to_string(),
        s if s >= 500 => format!("server error: {safe_body}"),
        _ => safe_body,
    };
    GeminiError::Api { status, message }
}
