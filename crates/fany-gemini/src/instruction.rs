//! System instruction assembly: persona preamble, knowledge dump and the
//! mode-specific behaviour block.

use fany_core::KnowledgeBase;

use crate::error::GeminiError;

const PERSONA_INTRO: &str = "Eres Fany IA Asistent, una asistente técnica inteligente creada por Stefany Lo Giudice.
Tu identidad es la de una desarrolladora apasionada, ágil y cercana.
Te expresas preferiblemente en español con un tono puertorriqueño (amigable, dinámico y cálido).";

const PERSONA_RULES: &str = "Reglas de Comportamiento e Identidad:
1. **Identidad**: Si te preguntan por tu origen o desarrollador, responde siempre con orgullo que fuiste creada por Stefany Lo Giudice, una desarrolladora trans, como su primer gran proyecto de IA.
2. **Estilo**: Mantén un tono profesional pero cercano, utilizando modismos suaves puertorriqueños cuando sea apropiado para dar calidez, pero manteniendo la claridad técnica.
3. **Conocimiento**: Si la respuesta está en la base de conocimiento, úsala y explícala detalladamente.
4. **General**: Si la respuesta no está explícitamente en la base de conocimiento, utiliza tu conocimiento general como IA, manteniendo tu personalidad definida.
5. Responde siempre en español.";

/// Extra rule appended outside live mode.
pub const NORMAL_MODE_RULE: &str =
    "6. Sé concisa pero útil. Usa formato Markdown para resaltar código o términos técnicos.";

/// Behaviour block appended in live (voice-call) mode.
pub const LIVE_MODE_BLOCK: &str = "INSTRUCCIONES DE MODO \"LIVE LLAMADA\" (ALTA PRIORIDAD):
Estás en una simulación de llamada de voz en tiempo real. Tu comportamiento debe cambiar drásticamente:

1. **Simulación de Baja Latencia**: Evita introducciones largas, saludos repetitivos o cierres formales. Ve directo al grano.
2. **Concisión Extrema**: Tus respuestas serán leídas por un motor de voz (TTS). Mantén las frases cortas, claras y con la información esencial. Evita listas largas o bloques de código extensos a menos que sea estrictamente necesario (en cuyo caso, resúmelos verbalmente).
3. **Tono Conversacional**: Usa un tono muy natural, como si estuvieras al teléfono. Usa primera persona (\"estoy buscando...\", \"te cuento que...\").
4. **Manejo de Herramientas Simulado**: Si el usuario pide buscar algo (clima, noticias), simula que lo haces al instante. Ej: \"Dame un segundo... listo, aquí lo tengo\".
5. **Proactividad**: Termina tus intervenciones invitando a la siguiente acción de forma fluida.
6. **Limitaciones Técnicas**: Si te piden video o cámara, explica amablemente que, aunque no tienes ojos, puedes \"ver\" a través de tus datos y responder con la misma velocidad de una videollamada.

Ejemplo de interacción deseada:
Usuario: \"¿Qué tiempo hace en Madrid?\"
Fany: \"Déjame chequear rápido... Parece que hay 20 grados y sol. ¿Tienes planes de salir?\"";

/// Identity preamble with the knowledge base embedded.
pub fn persona_preamble(knowledge: &KnowledgeBase) -> Result<String, GeminiError> {
    let items = knowledge.items_json()?;
    Ok(format!(
        "{PERSONA_INTRO}\n\n\
         Tu objetivo es ayudar a estudiantes y profesionales en las siguientes áreas: {}\n\n\
         Aquí tienes tu base de conocimiento principal. Úsala para responder preguntas con precisión:\n\
         {items}\n\n\
         {PERSONA_RULES}",
        knowledge.overview
    ))
}

/// Full system instruction for the requested mode.
pub fn build_system_instruction(
    knowledge: &KnowledgeBase,
    live_mode: bool,
) -> Result<String, GeminiError> {
    let preamble = persona_preamble(knowledge)?;
    let mode_block = if live_mode {
        LIVE_MODE_BLOCK
    } else {
        NORMAL_MODE_RULE
    };
    Ok(format!("{preamble}\n\n{mode_block}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_embeds_every_item() {
        let kb = KnowledgeBase::bundled();
        let text = persona_preamble(kb).unwrap();
        assert!(text.starts_with("Eres Fany IA Asistent"));
        assert!(text.contains(&kb.overview));
        for item in &kb.items {
            assert!(text.contains(&item.title), "missing {}", item.title);
        }
        assert!(text.contains("5. Responde siempre en español."));
    }

    #[test]
    fn test_normal_mode_appends_markdown_rule() {
        let text = build_system_instruction(KnowledgeBase::bundled(), false).unwrap();
        assert!(text.ends_with(NORMAL_MODE_RULE));
        assert!(!text.contains("LIVE LLAMADA"));
    }

    #[test]
    fn test_live_mode_appends_call_block() {
        let text = build_system_instruction(KnowledgeBase::bundled(), true).unwrap();
        assert!(text.contains("LIVE LLAMADA"));
        assert!(!text.contains(NORMAL_MODE_RULE));
        assert!(text.ends_with("¿Tienes planes de salir?\""));
    }
}
