//! Error types for speech input and output.

use fany_core::error::FanyError;

/// Errors from speech synthesis, recognition and settings persistence.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("speech capability unavailable: {0}")]
    Unavailable(String),
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no speech detected")]
    NoSpeech,
    #[error("speech recognition is already listening")]
    AlreadyListening,
    #[error("speech command failed: {0}")]
    Command(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<FanyError> for VoiceError {
    fn from(err: FanyError) -> Self {
        VoiceError::Storage(err.to_string())
    }
}

impl VoiceError {
    /// Text to show the user as an alert, if the condition deserves one.
    ///
    /// No-speech and transient failures are only logged.
    pub fn user_notice(&self) -> Option<&'static str> {
        match self {
            VoiceError::PermissionDenied => Some(
                "Permiso de micrófono denegado. Habilita el acceso al micrófono para usar el dictado.",
            ),
            VoiceError::Unavailable(_) => {
                Some("Tu sistema no soporta reconocimiento de voz.")
            }
            _ => None,
        }
    }
}
