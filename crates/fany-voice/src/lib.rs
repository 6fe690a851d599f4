//! Fany Voice crate - speech output, single-shot dictation and voice settings.
//!
//! Speech synthesis and recognition sit behind the `SpeechSynthesizer` and
//! `SpeechRecognizer` traits. Each has a no-op implementation for hosts
//! without speech support and an external-command implementation.
//! `Dictation` lazily builds its recognizer on first use.

pub mod error;
pub mod recognition;
pub mod settings;
pub mod synthesis;
pub mod text;
pub mod voices;

pub use error::VoiceError;
pub use recognition::{
    append_transcript, CommandRecognizer, Dictation, NoopRecognizer, RecognizerFactory,
    SpeechRecognizer,
};
pub use settings::{PreviewState, VoiceSettingsStore, PREVIEW_PHRASE};
pub use synthesis::{speak_text, CommandSynthesizer, NoopSynthesizer, SpeechSynthesizer, Utterance};
pub use text::strip_markdown;
pub use voices::{sort_voices, VoiceInfo};
