//! The chat session: ordered message log, request gating and live speech.
//!
//! At most one model request is in flight. A `send` that arrives while one
//! is pending, or with blank text, is ignored without touching the log.
//! Every append is written through to the key-value store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use fany_core::types::ChatMessage;
use fany_gemini::{LanguageModel, ModelRequest};
use fany_storage::KeyValueStore;
use fany_voice::{speak_text, SpeechSynthesizer, VoiceSettingsStore};

use crate::error::ChatError;
use crate::history::{fresh_log, load_history, outgoing_history, save_history};

/// Appended when the model call itself fails.
pub const PROCESSING_ERROR_REPLY: &str = "Lo siento, hubo un error procesando tu solicitud.";

const DEFAULT_SPEECH_LANGUAGE: &str = "es-ES";

/// Result of a `send` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank text or a request already in flight. The log is unchanged.
    Ignored,
    /// The model message that was appended.
    Replied(ChatMessage),
}

/// Clears the loading flag when a request ends, however it ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A single conversation with the assistant.
pub struct ChatSession {
    store: Arc<dyn KeyValueStore>,
    model: Arc<dyn LanguageModel>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice_settings: Arc<VoiceSettingsStore>,
    speech_language: String,
    messages: Mutex<Vec<ChatMessage>>,
    loading: AtomicBool,
    live_mode: AtomicBool,
    web_search: AtomicBool,
}

impl ChatSession {
    /// Open a session, restoring the persisted log.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        model: Arc<dyn LanguageModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voice_settings: Arc<VoiceSettingsStore>,
    ) -> Self {
        let messages = load_history(store.as_ref());
        tracing::info!(messages = messages.len(), "Chat session opened");
        Self {
            store,
            model,
            synthesizer,
            voice_settings,
            speech_language: DEFAULT_SPEECH_LANGUAGE.to_string(),
            messages: Mutex::new(messages),
            loading: AtomicBool::new(false),
            live_mode: AtomicBool::new(false),
            web_search: AtomicBool::new(false),
        }
    }

    /// Language tag used when speaking replies.
    pub fn with_speech_language(mut self, language: impl Into<String>) -> Self {
        self.speech_language = language.into();
        self
    }

    /// Snapshot of the log in order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_messages().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn live_mode(&self) -> bool {
        self.live_mode.load(Ordering::SeqCst)
    }

    pub fn web_search(&self) -> bool {
        self.web_search.load(Ordering::SeqCst)
    }

    /// Turning live mode off stops any speech in progress.
    pub fn set_live_mode(&self, enabled: bool) {
        self.live_mode.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.synthesizer.cancel();
        }
        tracing::info!(enabled, "Live mode changed");
    }

    /// Flip live mode and return the new value.
    pub fn toggle_live_mode(&self) -> bool {
        let enabled = !self.live_mode();
        self.set_live_mode(enabled);
        enabled
    }

    pub fn set_web_search(&self, enabled: bool) {
        self.web_search.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "Web search changed");
    }

    /// Flip web search and return the new value.
    pub fn toggle_web_search(&self) -> bool {
        let enabled = !self.web_search();
        self.set_web_search(enabled);
        enabled
    }

    /// Send a user message and append the model's reply.
    ///
    /// Model failures are turned into an apology message; this never fails.
    pub async fn send(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        if self.loading.swap(true, Ordering::SeqCst) {
            tracing::debug!("Request already in flight, ignoring send");
            return SendOutcome::Ignored;
        }
        let _loading = LoadingGuard(&self.loading);

        let history = {
            let mut messages = self.lock_messages();
            let history = outgoing_history(&messages);
            messages.push(ChatMessage::user(text));
            self.persist(&messages);
            history
        };

        let live_mode = self.live_mode();
        let request = ModelRequest {
            message: text.to_string(),
            history,
            live_mode,
            web_search: self.web_search(),
        };

        let reply = match self.model.generate(&request).await {
            Ok(reply) => {
                let message =
                    ChatMessage::model(reply.text).with_sources(reply.sources.unwrap_or_default());
                if live_mode {
                    if let Err(e) = self.speak(&message.text) {
                        tracing::warn!(error = %e, "Failed to speak reply");
                    }
                }
                message
            }
            Err(e) => {
                tracing::error!(error = %e, "Model request failed");
                ChatMessage::model(PROCESSING_ERROR_REPLY)
            }
        };

        {
            let mut messages = self.lock_messages();
            messages.push(reply.clone());
            self.persist(&messages);
        }

        SendOutcome::Replied(reply)
    }

    /// Reset the log to a single welcome message. Does nothing unless confirmed.
    pub fn clear_history(&self, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }
        self.synthesizer.cancel();
        let mut messages = self.lock_messages();
        *messages = fresh_log();
        self.persist(&messages);
        tracing::info!("Chat history cleared");
        true
    }

    /// Stop speech before the process exits.
    pub fn shutdown(&self) {
        self.synthesizer.cancel();
    }

    fn speak(&self, text: &str) -> Result<bool, ChatError> {
        let settings = self.voice_settings.current();
        Ok(speak_text(
            self.synthesizer.as_ref(),
            text,
            &settings,
            &self.speech_language,
        )?)
    }

    fn persist(&self, messages: &[ChatMessage]) {
        if let Err(e) = save_history(self.store.as_ref(), messages) {
            tracing::error!(error = %e, "Failed to persist chat history");
        }
    }

    fn lock_messages(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }
}
