//! Single-shot speech recognition for dictating into the input line.
//!
//! A dictation captures one utterance and appends the final transcript to
//! the current input. Only one dictation may be in flight; the recognizer
//! itself is constructed the first time dictation is requested.

use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::error::VoiceError;

/// Exit status a recognizer command uses to report a denied microphone.
pub const PERMISSION_DENIED_EXIT_CODE: i32 = 77;

/// Host speech recognition engine.
pub trait SpeechRecognizer: Send + Sync {
    /// Capture one utterance and return its final transcript.
    ///
    /// Returns `VoiceError::NoSpeech` when nothing was heard.
    fn recognize(&self, language: &str) -> Result<String, VoiceError>;
}

/// Builds the recognizer on first use.
pub type RecognizerFactory = Box<dyn Fn() -> Box<dyn SpeechRecognizer> + Send + Sync>;

/// Recognizer for hosts without speech input.
#[derive(Debug, Default)]
pub struct NoopRecognizer;

impl SpeechRecognizer for NoopRecognizer {
    fn recognize(&self, _language: &str) -> Result<String, VoiceError> {
        Err(VoiceError::Unavailable(
            "speech recognition is not supported".to_string(),
        ))
    }
}

/// Runs an external command that records one utterance and prints the
/// transcript on stdout. The language tag is passed as the last argument.
///
/// Exit code 77, or a stderr mentioning permission, means the microphone
/// was denied.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    /// Parse a whitespace-separated command line such as `fany-listen --once`.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn classify_failure(code: Option<i32>, stderr: &str) -> VoiceError {
        let lowered = stderr.to_lowercase();
        if code == Some(PERMISSION_DENIED_EXIT_CODE)
            || lowered.contains("permission")
            || lowered.contains("not-allowed")
        {
            VoiceError::PermissionDenied
        } else {
            VoiceError::Command(stderr.trim().to_string())
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn recognize(&self, language: &str) -> Result<String, VoiceError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(language)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    VoiceError::Unavailable(format!("{} not found", self.program))
                }
                _ => VoiceError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::classify_failure(output.status.code(), &stderr));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            return Err(VoiceError::NoSpeech);
        }
        Ok(transcript)
    }
}

/// Append a transcript to existing input, separated by a single space.
pub fn append_transcript(input: &str, transcript: &str) -> String {
    let input = input.trim_end();
    let transcript = transcript.trim();
    match (input.is_empty(), transcript.is_empty()) {
        (_, true) => input.to_string(),
        (true, false) => transcript.to_string(),
        (false, false) => format!("{} {}", input, transcript),
    }
}

/// Single-shot dictation with a lazily constructed recognizer.
pub struct Dictation {
    factory: RecognizerFactory,
    recognizer: OnceLock<Box<dyn SpeechRecognizer>>,
    language: String,
    listening: AtomicBool,
}

/// Clears the listening flag when a dictation ends, however it ends.
struct ListeningGuard<'a>(&'a AtomicBool);

impl Drop for ListeningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Dictation {
    pub fn new(language: impl Into<String>, factory: RecognizerFactory) -> Self {
        Self {
            factory,
            recognizer: OnceLock::new(),
            language: language.into(),
            listening: AtomicBool::new(false),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Whether the recognizer has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.recognizer.get().is_some()
    }

    /// Capture one utterance and return `input` with the transcript appended.
    ///
    /// Blocks until the recognizer finishes. On error the input is left
    /// untouched and the caller decides whether to alert the user.
    pub fn dictate(&self, input: &str) -> Result<String, VoiceError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(VoiceError::AlreadyListening);
        }
        let _guard = ListeningGuard(&self.listening);

        let recognizer = self.recognizer.get_or_init(|| {
            tracing::info!(language = %self.language, "Initialising speech recognizer");
            (self.factory)()
        });

        match recognizer.recognize(&self.language) {
            Ok(transcript) => {
                tracing::debug!(chars = transcript.len(), "Dictation finished");
                Ok(append_transcript(input, &transcript))
            }
            Err(VoiceError::NoSpeech) => {
                tracing::warn!("No speech detected during dictation");
                Err(VoiceError::NoSpeech)
            }
            Err(e) => {
                tracing::error!(error = %e, "Speech recognition error");
                Err(e)
            }
        }
    }
}
