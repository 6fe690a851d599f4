//! Persisted voice settings with presets and preview.

use std::sync::{Arc, RwLock};

use fany_core::error::FanyError;
use fany_core::types::{VoicePreset, VoiceSettings};
use fany_storage::{load_json, save_json, KeyValueStore, VOICE_SETTINGS_KEY};

use crate::error::VoiceError;
use crate::synthesis::{speak_text, SpeechSynthesizer};

/// Sample sentence spoken by `preview`.
pub const PREVIEW_PHRASE: &str = "Hola, soy Fany. Así es como sueno con la configuración actual.";

/// What a `preview` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Started,
    Stopped,
}

/// Current voice settings, written through to the key-value store on every change.
pub struct VoiceSettingsStore {
    store: Arc<dyn KeyValueStore>,
    settings: RwLock<VoiceSettings>,
}

impl VoiceSettingsStore {
    /// Load stored settings. Missing or unreadable data yields the defaults.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = match load_json::<VoiceSettings>(store.as_ref(), VOICE_SETTINGS_KEY) {
            Ok(Some(settings)) => settings.clamped(),
            Ok(None) => VoiceSettings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored voice settings unreadable, using defaults");
                VoiceSettings::default()
            }
        };
        Self {
            store,
            settings: RwLock::new(settings),
        }
    }

    pub fn current(&self) -> VoiceSettings {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Apply `change`, clamp into range and persist. Returns the new settings.
    ///
    /// The in-memory value is updated even if persisting fails.
    pub fn update<F>(&self, change: F) -> Result<VoiceSettings, FanyError>
    where
        F: FnOnce(&mut VoiceSettings),
    {
        let updated = {
            let mut guard = self.settings.write().unwrap_or_else(|e| e.into_inner());
            let mut next = guard.clone();
            change(&mut next);
            *guard = next.clamped();
            guard.clone()
        };
        save_json(self.store.as_ref(), VOICE_SETTINGS_KEY, &updated)?;
        tracing::debug!(
            pitch = updated.pitch,
            rate = updated.rate,
            volume = updated.volume,
            "Voice settings saved"
        );
        Ok(updated)
    }

    pub fn set_pitch(&self, pitch: f32) -> Result<VoiceSettings, FanyError> {
        self.update(|s| s.pitch = pitch)
    }

    pub fn set_rate(&self, rate: f32) -> Result<VoiceSettings, FanyError> {
        self.update(|s| s.rate = rate)
    }

    pub fn set_volume(&self, volume: f32) -> Result<VoiceSettings, FanyError> {
        self.update(|s| s.volume = volume)
    }

    /// Select a voice by URI. `None` or a blank URI means automatic selection.
    pub fn select_voice(&self, voice_uri: Option<String>) -> Result<VoiceSettings, FanyError> {
        let voice_uri = voice_uri.filter(|uri| !uri.trim().is_empty());
        self.update(|s| s.voice_uri = voice_uri)
    }

    pub fn apply_preset(&self, preset: VoicePreset) -> Result<VoiceSettings, FanyError> {
        self.update(|s| preset.apply(s))
    }

    /// Toggle the sample phrase: stop it if speech is playing, otherwise speak it.
    pub fn preview(
        &self,
        synth: &dyn SpeechSynthesizer,
        lang: &str,
    ) -> Result<PreviewState, VoiceError> {
        if synth.is_speaking() {
            synth.cancel();
            return Ok(PreviewState::Stopped);
        }
        speak_text(synth, PREVIEW_PHRASE, &self.current(), lang)?;
        Ok(PreviewState::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::Utterance;
    use crate::voices::VoiceInfo;
    use fany_storage::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn memory() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_defaults_when_absent() {
        let settings = VoiceSettingsStore::load(memory());
        assert_eq!(settings.current(), VoiceSettings::default());
    }

    #[test]
    fn test_defaults_when_corrupt() {
        let store = memory();
        store.set(VOICE_SETTINGS_KEY, "{not json").unwrap();
        let settings = VoiceSettingsStore::load(store);
        assert_eq!(settings.current(), VoiceSettings::default());
    }

    #[test]
    fn test_partial_object_keeps_present_keys() {
        let store = memory();
        store
            .set(VOICE_SETTINGS_KEY, r#"{"voiceURI":"es-419","pitch":1.5,"rate":1.2}"#)
            .unwrap();
        let current = VoiceSettingsStore::load(store).current();
        assert_eq!(current.voice_uri.as_deref(), Some("es-419"));
        assert_eq!(current.pitch, 1.5);
        assert_eq!(current.rate, 1.2);
        assert_eq!(current.volume, 1.0);
    }

    #[test]
    fn test_update_persists_and_reloads() {
        let store = memory();
        let settings = VoiceSettingsStore::load(Arc::clone(&store));
        settings.set_pitch(1.5).unwrap();
        settings.select_voice(Some("es-419".into())).unwrap();

        let raw = store.get(VOICE_SETTINGS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"voiceURI\":\"es-419\""));

        let reloaded = VoiceSettingsStore::load(store);
        assert_eq!(reloaded.current().pitch, 1.5);
        assert_eq!(reloaded.current().voice_uri.as_deref(), Some("es-419"));
    }

    #[test]
    fn test_values_clamped() {
        let settings = VoiceSettingsStore::load(memory());
        assert_eq!(settings.set_rate(5.0).unwrap().rate, 2.0);
        assert_eq!(settings.set_pitch(0.1).unwrap().pitch, 0.5);
        assert_eq!(settings.set_volume(-1.0).unwrap().volume, 0.0);
    }

    #[test]
    fn test_fast_preset_keeps_voice() {
        let settings = VoiceSettingsStore::load(memory());
        settings.select_voice(Some("X".into())).unwrap();
        settings.set_volume(0.3).unwrap();

        let s = settings.apply_preset(VoicePreset::Fast).unwrap();
        assert_eq!(s.rate, 1.2);
        assert_eq!(s.pitch, 1.1);
        assert_eq!(s.volume, 1.0);
        assert_eq!(s.voice_uri.as_deref(), Some("X"));
    }

    #[test]
    fn test_blank_voice_means_auto() {
        let settings = VoiceSettingsStore::load(memory());
        settings.select_voice(Some("X".into())).unwrap();
        assert!(settings.select_voice(Some("  ".into())).unwrap().voice_uri.is_none());
    }

    #[derive(Default)]
    struct ToggleSynth {
        speaking: AtomicBool,
        spoken: Mutex<Vec<Utterance>>,
    }

    impl SpeechSynthesizer for ToggleSynth {
        fn is_available(&self) -> bool {
            true
        }
        fn voices(&self) -> Vec<VoiceInfo> {
            Vec::new()
        }
        fn speak(&self, utterance: &Utterance) -> Result<(), VoiceError> {
            self.spoken.lock().unwrap().push(utterance.clone());
            self.speaking.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn cancel(&self) {
            self.speaking.store(false, Ordering::SeqCst);
        }
        fn is_speaking(&self) -> bool {
            self.speaking.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_preview_toggles() {
        let settings = VoiceSettingsStore::load(memory());
        settings.set_rate(1.3).unwrap();
        let synth = ToggleSynth::default();

        assert_eq!(settings.preview(&synth, "es-ES").unwrap(), PreviewState::Started);
        {
            let spoken = synth.spoken.lock().unwrap();
            assert_eq!(spoken[0].text, PREVIEW_PHRASE);
            assert_eq!(spoken[0].rate, 1.3);
        }

        assert_eq!(settings.preview(&synth, "es-ES").unwrap(), PreviewState::Stopped);
        assert!(!synth.is_speaking());
        assert_eq!(synth.spoken.lock().unwrap().len(), 1);
    }
}
