/// A voice offered by the speech synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Identifier persisted in `VoiceSettings::voice_uri`.
    pub voice_uri: String,
    pub name: String,
    /// BCP 47 style language tag, e.g. `es-419`.
    pub lang: String,
}

impl VoiceInfo {
    pub fn is_spanish(&self) -> bool {
        self.lang.to_lowercase().starts_with("es")
    }
}

/// Spanish voices first, then alphabetical by name ignoring case and accents.
pub fn sort_voices(mut voices: Vec<VoiceInfo>) -> Vec<VoiceInfo> {
    voices.sort_by_cached_key(|v| (!v.is_spanish(), collation_key(&v.name), v.name.clone()));
    voices
}

/// Lowercased name with Latin diacritics folded to their base letter.
fn collation_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
