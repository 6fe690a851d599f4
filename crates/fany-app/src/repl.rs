//! Line-oriented command parsing and text rendering for the REPL.

use fany_core::types::{ChatMessage, Role, VoicePreset, VoiceSettings};
use fany_core::KnowledgeItem;
use fany_voice::VoiceInfo;

pub const HELP_TEXT: &str = "\
Comandos disponibles:
  <texto>                      Envía un mensaje a Fany
  (línea vacía)                Envía el borrador dictado
  /buscar [texto]              Busca en la base de conocimientos
  /categoria <nombre|Todas>    Filtra la base de conocimientos por categoría
  /categorias                  Lista las categorías
  /live                        Activa o desactiva el modo en vivo
  /web                         Activa o desactiva la búsqueda web
  /dictar                      Dicta por micrófono y añade al borrador
  /borrar                      Borra el historial del chat
  /voz                         Muestra la configuración de voz
  /voces                       Lista las voces disponibles
  /voz usar <uri|auto>         Selecciona una voz
  /voz tono|velocidad|volumen <n>
  /voz preset <default|fast|calm>
  /voz probar                  Reproduce o detiene la frase de prueba
  /ayuda                       Muestra esta ayuda
  /salir                       Cierra Fany";

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Plain text to send.
    Send(String),
    /// Blank line: send whatever was dictated.
    SubmitDraft,
    Search(String),
    Category(String),
    Categories,
    ToggleLive,
    ToggleWeb,
    Dictate,
    Clear,
    ShowVoice,
    ListVoices,
    UseVoice(Option<String>),
    Pitch(f32),
    Rate(f32),
    Volume(f32),
    Preset(VoicePreset),
    Preview,
    Help,
    Quit,
    /// A slash command that could not be understood, with a hint.
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::SubmitDraft;
    }
    if !line.starts_with('/') {
        return Command::Send(line.to_string());
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "/buscar" => Command::Search(rest.to_string()),
        "/categoria" if !rest.is_empty() => Command::Category(rest.to_string()),
        "/categoria" => Command::Invalid("Uso: /categoria <nombre|Todas>".to_string()),
        "/categorias" => Command::Categories,
        "/live" => Command::ToggleLive,
        "/web" => Command::ToggleWeb,
        "/dictar" => Command::Dictate,
        "/borrar" => Command::Clear,
        "/voces" => Command::ListVoices,
        "/voz" => parse_voice(rest),
        "/ayuda" | "/help" => Command::Help,
        "/salir" | "/exit" | "/quit" => Command::Quit,
        other => Command::Invalid(format!("Comando desconocido: {}. Escribe /ayuda.", other)),
    }
}

fn parse_voice(args: &str) -> Command {
    let mut parts = args.split_whitespace();
    let Some(sub) = parts.next() else {
        return Command::ShowVoice;
    };
    let value = parts.next();

    match sub {
        "usar" => match value {
            Some("auto") | None => Command::UseVoice(None),
            Some(uri) => Command::UseVoice(Some(uri.to_string())),
        },
        "tono" => parse_number(value, Command::Pitch),
        "velocidad" => parse_number(value, Command::Rate),
        "volumen" => parse_number(value, Command::Volume),
        "preset" => match value.map(str::parse::<VoicePreset>) {
            Some(Ok(preset)) => Command::Preset(preset),
            _ => Command::Invalid("Uso: /voz preset <default|fast|calm>".to_string()),
        },
        "probar" => Command::Preview,
        other => Command::Invalid(format!("Opción de voz desconocida: {}", other)),
    }
}

fn parse_number(value: Option<&str>, make: fn(f32) -> Command) -> Command {
    match value.map(|v| v.replace(',', ".").parse::<f32>()) {
        Some(Ok(n)) if n.is_finite() => make(n),
        _ => Command::Invalid("Indica un número, por ejemplo 1.2".to_string()),
    }
}

/// Answer typed at the clear-history confirmation prompt.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}

pub fn render_message(message: &ChatMessage) -> String {
    let speaker = match message.role {
        Role::User => "Tú",
        Role::Model => "Fany",
    };
    let mut out = format!(
        "[{}] {}: {}",
        message.timestamp.format("%H:%M"),
        speaker,
        message.text
    );
    if let Some(sources) = &message.sources {
        out.push_str("\n  Fuentes:");
        for source in sources {
            out.push_str(&format!("\n  - {} <{}>", source.title, source.uri));
        }
    }
    out
}

pub fn render_item(item: &KnowledgeItem) -> String {
    let tags: Vec<String> = item.tag_list().map(|t| format!("#{}", t)).collect();
    format!(
        "== {} [{}]\n{}\n{}",
        item.title,
        item.category,
        item.content,
        tags.join(" ")
    )
}

pub fn render_voice_settings(settings: &VoiceSettings) -> String {
    format!(
        "Voz: {}\nTono: {:.1}  Velocidad: {:.1}  Volumen: {:.0}%",
        settings.voice_uri.as_deref().unwrap_or("automática"),
        settings.pitch,
        settings.rate,
        settings.volume * 100.0
    )
}

pub fn render_voice(voice: &VoiceInfo, selected: Option<&str>) -> String {
    let marker = if selected == Some(voice.voice_uri.as_str()) {
        "*"
    } else {
        " "
    };
    format!("{} {} ({}) [{}]", marker, voice.name, voice.lang, voice.voice_uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fany_core::types::Source;

    #[test]
    fn test_plain_text_is_send() {
        assert_eq!(
            parse_command("  ¿Qué es una API?  "),
            Command::Send("¿Qué es una API?".to_string())
        );
        assert_eq!(parse_command("   "), Command::SubmitDraft);
    }

    #[test]
    fn test_knowledge_commands() {
        assert_eq!(parse_command("/buscar api"), Command::Search("api".into()));
        assert_eq!(parse_command("/buscar"), Command::Search(String::new()));
        assert_eq!(
            parse_command("/categoria Soporte Técnico"),
            Command::Category("Soporte Técnico".into())
        );
        assert!(matches!(parse_command("/categoria"), Command::Invalid(_)));
        assert_eq!(parse_command("/categorias"), Command::Categories);
    }

    #[test]
    fn test_mode_and_session_commands() {
        assert_eq!(parse_command("/live"), Command::ToggleLive);
        assert_eq!(parse_command("/web"), Command::ToggleWeb);
        assert_eq!(parse_command("/dictar"), Command::Dictate);
        assert_eq!(parse_command("/borrar"), Command::Clear);
        assert_eq!(parse_command("/ayuda"), Command::Help);
        assert_eq!(parse_command("/salir"), Command::Quit);
        assert!(matches!(parse_command("/foo"), Command::Invalid(_)));
    }

    #[test]
    fn test_voice_commands() {
        assert_eq!(parse_command("/voz"), Command::ShowVoice);
        assert_eq!(parse_command("/voces"), Command::ListVoices);
        assert_eq!(parse_command("/voz usar es-419"), Command::UseVoice(Some("es-419".into())));
        assert_eq!(parse_command("/voz usar auto"), Command::UseVoice(None));
        assert_eq!(parse_command("/voz tono 1.5"), Command::Pitch(1.5));
        assert_eq!(parse_command("/voz velocidad 1,2"), Command::Rate(1.2));
        assert_eq!(parse_command("/voz volumen 0.5"), Command::Volume(0.5));
        assert_eq!(parse_command("/voz preset calm"), Command::Preset(VoicePreset::Calm));
        assert_eq!(parse_command("/voz preset rápido"), Command::Preset(VoicePreset::Fast));
        assert_eq!(parse_command("/voz probar"), Command::Preview);
        assert!(matches!(parse_command("/voz tono alto"), Command::Invalid(_)));
        assert!(matches!(parse_command("/voz preset loud"), Command::Invalid(_)));
        assert!(matches!(parse_command("/voz gritar"), Command::Invalid(_)));
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("s"));
        assert!(is_affirmative(" Sí "));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_render_message_with_sources() {
        let message = ChatMessage::model("Hola").with_sources(vec![Source {
            uri: "https://example.com".into(),
            title: "Ejemplo".into(),
        }]);
        let out = render_message(&message);
        assert!(out.contains("Fany: Hola"));
        assert!(out.contains("- Ejemplo <https://example.com>"));
    }

    #[test]
    fn test_render_voice_settings() {
        let out = render_voice_settings(&VoiceSettings::default());
        assert!(out.contains("automática"));
        assert!(out.contains("Volumen: 100%"));
    }

    #[test]
    fn test_render_voice_marks_selection() {
        let voice = VoiceInfo {
            voice_uri: "es".into(),
            name: "Spanish (Spain)".into(),
            lang: "es".into(),
        };
        assert!(render_voice(&voice, Some("es")).starts_with('*'));
        assert!(render_voice(&voice, None).starts_with(' '));
    }
}
