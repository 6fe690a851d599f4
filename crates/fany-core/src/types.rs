use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Chat
// =============================================================================

/// Identifier of the synthetic greeting that seeds every conversation.
pub const WELCOME_MESSAGE_ID: &str = "welcome";

/// Text of the synthetic greeting.
pub const WELCOME_MESSAGE_TEXT: &str = "¡Hola! Soy Fany IA, tu asistente técnico. ¿En qué puedo ayudarte hoy con respecto a programación, soporte técnico o IA?";

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing or dictating.
    User,
    /// The language model.
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A web citation attached to a model reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

/// One entry of the append-only conversation log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

impl ChatMessage {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            sources: None,
        }
    }

    /// A message typed or dictated by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// A reply produced by the model.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// A fresh greeting with the current timestamp.
    pub fn welcome() -> Self {
        Self {
            id: WELCOME_MESSAGE_ID.to_string(),
            ..Self::model(WELCOME_MESSAGE_TEXT)
        }
    }

    /// Attach citations. An empty list leaves `sources` unset.
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = if sources.is_empty() {
            None
        } else {
            Some(sources)
        };
        self
    }

    pub fn is_welcome(&self) -> bool {
        self.id == WELCOME_MESSAGE_ID
    }
}

// =============================================================================
// Voice
// =============================================================================

/// Allowed pitch range (inclusive).
pub const PITCH_RANGE: (f32, f32) = (0.5, 2.0);
/// Allowed speaking-rate range (inclusive).
pub const RATE_RANGE: (f32, f32) = (0.5, 2.0);
/// Allowed volume range (inclusive).
pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

/// Persisted text-to-speech parameters.
///
/// Field names on the wire match the stored JSON (`voiceURI`). Missing keys
/// take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    #[serde(rename = "voiceURI")]
    pub voice_uri: Option<String>,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_uri: None,
            pitch: 1.0,
            rate: 1.0,
            volume: 1.0,
        }
    }
}

impl VoiceSettings {
    /// Clamp pitch, rate and volume into their allowed ranges.
    ///
    /// Non-finite values fall back to the defaults.
    pub fn clamped(mut self) -> Self {
        let defaults = Self::default();
        self.pitch = clamp_or(self.pitch, PITCH_RANGE, defaults.pitch);
        self.rate = clamp_or(self.rate, RATE_RANGE, defaults.rate);
        self.volume = clamp_or(self.volume, VOLUME_RANGE, defaults.volume);
        self
    }
}

fn clamp_or(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Fixed voice presets offered by the settings view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicePreset {
    Default,
    Fast,
    Calm,
}

impl VoicePreset {
    /// Overwrite rate, pitch and volume. The selected voice is kept.
    pub fn apply(&self, settings: &mut VoiceSettings) {
        let (rate, pitch) = match self {
            VoicePreset::Default => (1.0, 1.0),
            VoicePreset::Fast => (1.2, 1.1),
            VoicePreset::Calm => (0.9, 0.9),
        };
        settings.rate = rate;
        settings.pitch = pitch;
        settings.volume = 1.0;
    }
}

impl FromStr for VoicePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "normal" | "predeterminado" => Ok(VoicePreset::Default),
            "fast" | "rapido" | "rápido" => Ok(VoicePreset::Fast),
            "calm" | "calmado" | "calma" => Ok(VoicePreset::Calm),
            other => Err(format!("unknown voice preset: {}", other)),
        }
    }
}
