//! Error types for the chat session.

use fany_core::error::FanyError;
use fany_voice::VoiceError;

/// Errors from the chat session. None of them reach the user directly.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("voice error: {0}")]
    VoiceError(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<FanyError> for ChatError {
    fn from(err: FanyError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}

impl From<VoiceError> for ChatError {
    fn from(err: VoiceError) -> Self {
        ChatError::VoiceError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::VoiceError("no tts".to_string());
        assert_eq!(err.to_string(), "voice error: no tts");

        let err = ChatError::StorageError("disk full".to_string());
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn test_chat_error_from_fany_error() {
        let err: ChatError = FanyError::Storage("connection lost".to_string()).into();
        assert!(matches!(err, ChatError::StorageError(_)));
        assert!(err.to_string().contains("connection lost"));
    }

    #[test]
    fn test_chat_error_from_voice_error() {
        let err: ChatError = VoiceError::NoSpeech.into();
        assert_eq!(err.to_string(), "voice error: no speech detected");
    }
}
