use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FanyError, Result};

/// Environment variables consulted for the Gemini API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Top-level configuration for Fany IA.
///
/// Loaded from `~/.fany/config.toml` by default. Every section falls back to
/// its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FanyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl FanyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FanyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FanyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding `fany.db` (chat history and voice settings).
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.fany/data".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted generative-language service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key. When unset, `GEMINI_API_KEY` and then `API_KEY` are consulted.
    pub api_key: Option<String>,
    /// Base URL of the REST endpoint (no trailing slash).
    pub base_url: String,
    /// Model used for regular replies.
    pub model: String,
    /// Model used when web-search augmentation is requested.
    pub search_model: String,
    /// Sampling temperature for regular replies.
    pub temperature: f32,
    /// Sampling temperature in live mode.
    pub live_temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-3-pro-preview".to_string(),
            search_model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            live_temperature: 0.8,
        }
    }
}

impl GeminiConfig {
    /// Resolve the API key from the config file, then the environment.
    ///
    /// Empty values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

/// Speech synthesis and recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether speech output is enabled at all.
    pub enabled: bool,
    /// Text-to-speech command (espeak-ng compatible flags).
    pub synthesizer_command: String,
    /// External speech-to-text command. `None` disables dictation.
    pub recognizer_command: Option<String>,
    /// Recognition language tag.
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            synthesizer_command: "espeak-ng".to_string(),
            recognizer_command: None,
            language: "es-ES".to_string(),
        }
    }
}

/// Initial chat mode flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Start in live (voice-call) mode.
    pub live_mode: bool,
    /// Start with web-search augmentation enabled.
    pub web_search: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = FanyConfig::default();
        assert_eq!(config.general.data_dir, "~/.fany/data");
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.gemini.model, "gemini-3-pro-preview");
        assert_eq!(config.gemini.search_model, "gemini-2.5-flash");
        assert!((config.gemini.temperature - 0.7).abs() < f32::EPSILON);
        assert!((config.gemini.live_temperature - 0.8).abs() < f32::EPSILON);
        assert!(config.voice.enabled);
        assert_eq!(config.voice.language, "es-ES");
        assert!(config.voice.recognizer_command.is_none());
        assert!(!config.chat.live_mode);
        assert!(!config.chat.web_search);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/custom/data"
log_level = "debug"

[gemini]
api_key = "abc123"
base_url = "http://127.0.0.1:9000"
temperature = 0.5

[voice]
enabled = false
recognizer_command = "whisper-once"

[chat]
live_mode = true
"#;
        let file = create_temp_config(content);
        let config = FanyConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/custom/data");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.gemini.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.gemini.base_url, "http://127.0.0.1:9000");
        assert!((config.gemini.temperature - 0.5).abs() < f32::EPSILON);
        // Unspecified fields keep their defaults
        assert_eq!(config.gemini.model, "gemini-3-pro-preview");
        assert!(!config.voice.enabled);
        assert_eq!(
            config.voice.recognizer_command.as_deref(),
            Some("whisper-once")
        );
        assert!(config.chat.live_mode);
        assert!(!config.chat.web_search);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = FanyConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.fany/data");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = FanyConfig::load(file.path());
        assert!(matches!(result, Err(FanyError::Config(_))));
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = FanyConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.voice.synthesizer_command, "espeak-ng");
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = FanyConfig::default();
        config.chat.web_search = true;
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = FanyConfig::load(&path).unwrap();
        assert!(reloaded.chat.web_search);
        assert_eq!(reloaded.gemini.base_url, config.gemini.base_url);
    }

    #[test]
    fn test_configured_api_key_wins() {
        let gemini = GeminiConfig {
            api_key: Some("  from-file  ".to_string()),
            ..GeminiConfig::default()
        };
        assert_eq!(gemini.resolve_api_key().as_deref(), Some("from-file"));
    }
}
