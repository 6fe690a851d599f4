//! Text-to-speech output.
//!
//! `SpeechSynthesizer` abstracts over the host speech engine. At most one
//! utterance plays at a time: `speak` cancels whatever was playing before.

use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, OnceLock};

use fany_core::types::VoiceSettings;

use crate::error::VoiceError;
use crate::text::strip_markdown;
use crate::voices::{sort_voices, VoiceInfo};

/// Words per minute at rate 1.0.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
/// espeak pitch at 1.0, on its 0..=99 scale.
const BASE_PITCH: f32 = 50.0;
/// espeak amplitude at volume 1.0.
const BASE_AMPLITUDE: f32 = 100.0;

/// A single piece of text to speak with its prosody.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Voice to use; `None` lets the engine pick its default for `lang`.
    pub voice_uri: Option<String>,
    pub lang: String,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

impl Utterance {
    /// Build an utterance carrying the pitch, rate, volume and voice of `settings`.
    pub fn from_settings(text: impl Into<String>, settings: &VoiceSettings, lang: &str) -> Self {
        Self {
            text: text.into(),
            voice_uri: settings.voice_uri.clone(),
            lang: lang.to_string(),
            pitch: settings.pitch,
            rate: settings.rate,
            volume: settings.volume,
        }
    }
}

/// Host speech synthesis engine.
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether the engine can speak at all on this host.
    fn is_available(&self) -> bool;

    /// Voices the engine offers, unsorted.
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Start speaking, replacing any utterance in progress.
    fn speak(&self, utterance: &Utterance) -> Result<(), VoiceError>;

    /// Stop any utterance in progress. No-op when idle.
    fn cancel(&self);

    fn is_speaking(&self) -> bool;
}

/// Cancel current speech, strip markdown and speak `text` with `settings`.
///
/// The selected voice is only used when the engine actually offers it.
/// Returns `false` when nothing was left to say after cleaning.
pub fn speak_text(
    synth: &dyn SpeechSynthesizer,
    text: &str,
    settings: &VoiceSettings,
    lang: &str,
) -> Result<bool, VoiceError> {
    if !synth.is_available() {
        return Err(VoiceError::Unavailable(
            "speech synthesis is not supported".to_string(),
        ));
    }

    synth.cancel();

    let clean = strip_markdown(text);
    if clean.trim().is_empty() {
        return Ok(false);
    }

    let mut utterance = Utterance::from_settings(clean, settings, lang);
    if let Some(uri) = utterance.voice_uri.take() {
        if synth.voices().iter().any(|v| v.voice_uri == uri) {
            utterance.voice_uri = Some(uri);
        } else {
            tracing::debug!(voice = %uri, "Selected voice not offered, using default");
        }
    }

    synth.speak(&utterance)?;
    Ok(true)
}

// =============================================================================
// NoopSynthesizer
// =============================================================================

/// Synthesizer for hosts without speech output. Reports itself unavailable.
#[derive(Debug, Default)]
pub struct NoopSynthesizer;

impl SpeechSynthesizer for NoopSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    fn speak(&self, _utterance: &Utterance) -> Result<(), VoiceError> {
        Err(VoiceError::Unavailable(
            "speech synthesis is not supported".to_string(),
        ))
    }

    fn cancel(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

// =============================================================================
// CommandSynthesizer
// =============================================================================

/// Speaks through an espeak-compatible command (`espeak-ng` by default).
///
/// Each utterance runs as a child process; `cancel` kills it.
pub struct CommandSynthesizer {
    program: String,
    current: Mutex<Option<Child>>,
    voices: OnceLock<Vec<VoiceInfo>>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            current: Mutex::new(None),
            voices: OnceLock::new(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for an utterance.
    pub fn args_for(utterance: &Utterance) -> Vec<String> {
        let voice = utterance
            .voice_uri
            .clone()
            .unwrap_or_else(|| default_voice_for(&utterance.lang));
        let speed = (utterance.rate * BASE_WORDS_PER_MINUTE).round() as u32;
        let pitch = (utterance.pitch * BASE_PITCH).round().clamp(0.0, 99.0) as u32;
        let amplitude = (utterance.volume * BASE_AMPLITUDE).round().clamp(0.0, 200.0) as u32;

        vec![
            "-v".to_string(),
            voice,
            "-s".to_string(),
            speed.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            "--".to_string(),
            utterance.text.clone(),
        ]
    }

    /// Parse the table printed by `--voices`.
    ///
    /// Columns are `Pty Language Age/Gender VoiceName File [Other Languages]`.
    pub fn parse_voice_list(output: &str) -> Vec<VoiceInfo> {
        output
            .lines()
            .skip(1)
            .filter_map(|line| {
                let cols: Vec<&str> = line.split_whitespace().collect();
                if cols.len() < 4 {
                    return None;
                }
                let lang = cols[1];
                Some(VoiceInfo {
                    voice_uri: lang.to_string(),
                    name: cols[3].replace('_', " "),
                    lang: lang.to_string(),
                })
            })
            .collect()
    }

    fn load_voices(&self) -> Vec<VoiceInfo> {
        match Command::new(&self.program).arg("--voices").output() {
            Ok(output) if output.status.success() => {
                let list = String::from_utf8_lossy(&output.stdout);
                sort_voices(Self::parse_voice_list(&list))
            }
            Ok(output) => {
                tracing::warn!(status = %output.status, "Voice listing command failed");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "Failed to list voices");
                Vec::new()
            }
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<Child>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// `es-ES` becomes `es`, which every espeak build ships.
fn default_voice_for(lang: &str) -> String {
    lang.split(['-', '_'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("es")
        .to_lowercase()
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.get_or_init(|| self.load_voices()).clone()
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), VoiceError> {
        self.cancel();

        let child = Command::new(&self.program)
            .args(Self::args_for(utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VoiceError::Command(format!("{}: {}", self.program, e)))?;

        tracing::debug!(pid = child.id(), chars = utterance.text.len(), "Speaking");
        *self.lock_current() = Some(child);
        Ok(())
    }

    fn cancel(&self) {
        if let Some(mut child) = self.lock_current().take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "Speech process already finished");
            }
            let _ = child.wait();
        }
    }

    fn is_speaking(&self) -> bool {
        let mut current = self.lock_current();
        let running = match current.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        };
        if !running {
            *current = None;
        }
        running
    }
}
