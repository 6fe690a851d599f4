//! Fany application binary - composition root.
//!
//! Ties the Fany crates into a terminal assistant:
//! 1. Load `.env`, CLI arguments and the TOML configuration
//! 2. Open the SQLite key-value store under the data directory
//! 3. Build the Gemini client, the speech engines and the voice settings
//! 4. Restore the chat session and run the interactive REPL

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use fany_chat::{ChatSession, SendOutcome};
use fany_core::{CategoryFilter, FanyConfig, KnowledgeBase};
use fany_gemini::GeminiClient;
use fany_storage::{Database, KeyValueStore};
use fany_voice::{
    append_transcript, CommandRecognizer, CommandSynthesizer, Dictation, NoopRecognizer,
    NoopSynthesizer, PreviewState, SpeechRecognizer, SpeechSynthesizer, VoiceError,
    VoiceSettingsStore,
};

use cli::{expand_home, CliArgs};
use repl::{Command, HELP_TEXT};

/// Everything the REPL needs, built once at start-up.
struct App {
    session: ChatSession,
    knowledge: &'static KnowledgeBase,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice_settings: Arc<VoiceSettingsStore>,
    dictation: Option<Arc<Dictation>>,
    language: String,
    search_term: String,
    category: CategoryFilter,
    draft: String,
}

fn build_env_filter(cli_level: Option<&str>, config_level: &str) -> tracing_subscriber::EnvFilter {
    if let Some(level) = cli_level {
        return tracing_subscriber::EnvFilter::new(level);
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config_level))
}

fn build_synthesizer(config: &FanyConfig) -> Arc<dyn SpeechSynthesizer> {
    if !config.voice.enabled {
        return Arc::new(NoopSynthesizer);
    }
    let synth = CommandSynthesizer::new(config.voice.synthesizer_command.clone());
    if synth.is_available() {
        tracing::info!(program = %synth.program(), "Speech synthesis ready");
        Arc::new(synth)
    } else {
        tracing::warn!(program = %synth.program(), "Speech synthesizer not found, voice output disabled");
        Arc::new(NoopSynthesizer)
    }
}

fn build_dictation(config: &FanyConfig) -> Option<Arc<Dictation>> {
    if !config.voice.enabled {
        return None;
    }
    let command = config.voice.recognizer_command.clone();
    Some(Arc::new(Dictation::new(
        config.voice.language.clone(),
        Box::new(move || -> Box<dyn SpeechRecognizer> {
            match command.as_deref().and_then(CommandRecognizer::from_command_line) {
                Some(recognizer) => Box::new(recognizer),
                None => Box::new(NoopRecognizer),
            }
        }),
    )))
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    match lines.next_line().await {
        Ok(line) => line,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read from stdin");
            None
        }
    }
}

impl App {
    fn print_knowledge(&self) {
        let items = self.knowledge.filter(&self.search_term, &self.category);
        if items.is_empty() {
            println!("No se encontraron temas para \"{}\" en {}.", self.search_term, self.category.label());
            return;
        }
        println!("{} tema(s) en {}:", items.len(), self.category.label());
        for item in items {
            println!("{}\n", repl::render_item(item));
        }
    }

    async fn send(&mut self, text: String) {
        let text = append_transcript(&std::mem::take(&mut self.draft), &text);
        if text.trim().is_empty() {
            return;
        }
        println!("Fany está escribiendo...");
        match self.session.send(&text).await {
            SendOutcome::Replied(reply) => println!("{}\n", repl::render_message(&reply)),
            SendOutcome::Ignored => println!("Espera a que termine la respuesta anterior."),
        }
    }

    async fn dictate(&mut self) {
        let Some(dictation) = self.dictation.clone() else {
            println!("La voz está desactivada.");
            return;
        };
        println!("Escuchando... habla ahora.");
        let draft = self.draft.clone();
        let result = tokio::task::spawn_blocking(move || dictation.dictate(&draft)).await;
        match result {
            Ok(Ok(text)) => {
                self.draft = text;
                println!("Borrador: {}\n(Pulsa Enter para enviarlo)", self.draft);
            }
            Ok(Err(VoiceError::NoSpeech)) => println!("No se detectó voz."),
            Ok(Err(e)) => {
                if let Some(notice) = e.user_notice() {
                    println!("{}", notice);
                }
            }
            Err(e) => tracing::error!(error = %e, "Dictation task failed"),
        }
    }

    fn report_settings(&self, result: Result<fany_core::types::VoiceSettings, fany_core::FanyError>) {
        match result {
            Ok(settings) => println!("{}", repl::render_voice_settings(&settings)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to save voice settings");
                println!("{}", repl::render_voice_settings(&self.voice_settings.current()));
            }
        }
    }

    fn preview(&self) {
        match self.voice_settings.preview(self.synthesizer.as_ref(), &self.language) {
            Ok(PreviewState::Started) => println!("Reproduciendo voz de prueba..."),
            Ok(PreviewState::Stopped) => println!("Prueba detenida."),
            Err(e) => {
                tracing::warn!(error = %e, "Voice preview failed");
                println!("La síntesis de voz no está disponible.");
            }
        }
    }

    /// Handle one command. Returns `false` when the REPL should exit.
    async fn handle(&mut self, command: Command, lines: &mut Lines<BufReader<Stdin>>) -> bool {
        match command {
            Command::Send(text) => self.send(text).await,
            Command::SubmitDraft => {
                if !self.draft.is_empty() {
                    self.send(String::new()).await;
                }
            }
            Command::Search(term) => {
                self.search_term = term;
                self.print_knowledge();
            }
            Command::Category(label) => {
                self.category = CategoryFilter::from_label(&label);
                self.print_knowledge();
            }
            Command::Categories => {
                for category in self.knowledge.categories() {
                    let marker = if category == self.category.label() { "*" } else { " " };
                    println!("{} {}", marker, category);
                }
            }
            Command::ToggleLive => {
                let on = self.session.toggle_live_mode();
                println!("Modo en vivo {}", if on { "activado" } else { "desactivado" });
            }
            Command::ToggleWeb => {
                let on = self.session.toggle_web_search();
                println!("Búsqueda web {}", if on { "activada" } else { "desactivada" });
            }
            Command::Dictate => self.dictate().await,
            Command::Clear => {
                println!("¿Estás seguro de que quieres borrar todo el historial? (s/n)");
                let confirmed = read_line(lines).await.is_some_and(|a| repl::is_affirmative(&a));
                if self.session.clear_history(confirmed) {
                    for message in self.session.messages() {
                        println!("{}\n", repl::render_message(&message));
                    }
                }
            }
            Command::ShowVoice => {
                println!("{}", repl::render_voice_settings(&self.voice_settings.current()))
            }
            Command::ListVoices => {
                let selected = self.voice_settings.current().voice_uri;
                let voices = self.synthesizer.voices();
                if voices.is_empty() {
                    println!("No hay voces disponibles.");
                }
                for voice in voices {
                    println!("{}", repl::render_voice(&voice, selected.as_deref()));
                }
            }
            Command::UseVoice(uri) => self.report_settings(self.voice_settings.select_voice(uri)),
            Command::Pitch(n) => self.report_settings(self.voice_settings.set_pitch(n)),
            Command::Rate(n) => self.report_settings(self.voice_settings.set_rate(n)),
            Command::Volume(n) => self.report_settings(self.voice_settings.set_volume(n)),
            Command::Preset(preset) => {
                self.report_settings(self.voice_settings.apply_preset(preset))
            }
            Command::Preview => self.preview(),
            Command::Help => println!("{}", HELP_TEXT),
            Command::Quit => return false,
            Command::Invalid(hint) => println!("{}", hint),
        }
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {}", e);
        }
    }

    let args = CliArgs::parse();
    let config_file = args.resolve_config_path();
    let mut config = FanyConfig::load_or_default(&config_file);
    args.apply_to(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(
            args.resolve_log_level().as_deref(),
            &config.general.log_level,
        ))
        .init();

    tracing::info!("Starting Fany v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let db_path = data_dir.join("fany.db");
    let store: Arc<dyn KeyValueStore> = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Model.
    let client = GeminiClient::new(config.gemini.clone());
    if !client.has_api_key() {
        tracing::warn!("No Gemini API key found (set GEMINI_API_KEY or gemini.api_key)");
    }

    // Voice.
    let synthesizer = build_synthesizer(&config);
    let voice_settings = Arc::new(VoiceSettingsStore::load(Arc::clone(&store)));

    let session = ChatSession::open(
        Arc::clone(&store),
        Arc::new(client),
        Arc::clone(&synthesizer),
        Arc::clone(&voice_settings),
    )
    .with_speech_language(config.voice.language.clone());
    session.set_live_mode(config.chat.live_mode);
    session.set_web_search(config.chat.web_search);

    let mut app = App {
        session,
        knowledge: KnowledgeBase::bundled(),
        synthesizer,
        voice_settings,
        dictation: build_dictation(&config),
        language: config.voice.language.clone(),
        search_term: String::new(),
        category: CategoryFilter::All,
        draft: String::new(),
    };

    for message in app.session.messages() {
        println!("{}\n", repl::render_message(&message));
    }
    println!("Escribe /ayuda para ver los comandos.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = read_line(&mut lines).await {
        if !app.handle(repl::parse_command(&line), &mut lines).await {
            break;
        }
    }

    app.session.shutdown();
    tracing::info!("Fany stopped");
    Ok(())
}
