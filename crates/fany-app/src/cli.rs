//! CLI argument definitions for the Fany application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use fany_core::FanyConfig;

/// Fany IA - a Spanish-speaking technical assistant for the terminal.
#[derive(Parser, Debug)]
#[command(name = "fany", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the SQLite store.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Start with live mode on (short answers, spoken aloud).
    #[arg(long = "live")]
    pub live: bool,

    /// Start with web search augmentation on.
    #[arg(long = "web-search")]
    pub web_search: bool,

    /// Disable speech output and dictation.
    #[arg(long = "no-voice")]
    pub no_voice: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > FANY_CONFIG env var > platform default (~/.fany/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("FANY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory path.
    ///
    /// Returns `None` if not overridden (use config value).
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level.
    ///
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    /// Fold the command-line overrides into a loaded configuration.
    pub fn apply_to(&self, config: &mut FanyConfig) {
        if let Some(dir) = self.resolve_data_dir() {
            config.general.data_dir = dir;
        }
        if let Some(level) = self.resolve_log_level() {
            config.general.log_level = level;
        }
        if self.live {
            config.chat.live_mode = true;
        }
        if self.web_search {
            config.chat.web_search = true;
        }
        if self.no_voice {
            config.voice.enabled = false;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".fany").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}
