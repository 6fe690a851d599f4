//! Gemini REST client using reqwest.
//!
//! The model only generates text. Every failure, including a missing API
//! key, is turned into a fixed Spanish reply by the `LanguageModel` impl.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use fany_core::config::GeminiConfig;
use fany_core::types::Source;
use fany_core::KnowledgeBase;

use crate::error::{map_http_error, GeminiError};
use crate::instruction::build_system_instruction;
use crate::types::{Content, GenerateContentRequest, GenerationConfig, ModelReply, ModelRequest, Tool};
use crate::LanguageModel;

/// Reply used when no API key is configured.
pub const MISSING_KEY_REPLY: &str = "Error de configuración: No se encontró la clave API.";

/// Reply used for transport, status and decoding failures.
pub const SERVICE_ERROR_REPLY: &str = "Hubo un error al comunicarse con el servidor de IA. Por favor, verifica tu conexión o intenta más tarde.";

/// Reply used when the service answers without any text.
pub const EMPTY_REPLY: &str = "Lo siento, no pude generar una respuesta.";

/// HTTP client for the `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
    api_key: Option<String>,
    knowledge: Arc<KnowledgeBase>,
}

impl GeminiClient {
    /// Create a client from configuration, resolving the API key from the
    /// config file or the environment, with the bundled knowledge base.
    pub fn new(config: GeminiConfig) -> Self {
        let api_key = config.resolve_api_key();
        Self {
            http: reqwest::Client::new(),
            config,
            api_key,
            knowledge: Arc::new(KnowledgeBase::bundled().clone()),
        }
    }

    /// Override the API key (`None` simulates a missing credential).
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Use a different knowledge base in the system instruction.
    pub fn with_knowledge(mut self, knowledge: Arc<KnowledgeBase>) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Model identifier for the requested mode.
    pub fn model_for(&self, web_search: bool) -> &str {
        if web_search {
            &self.config.search_model
        } else {
            &self.config.model
        }
    }

    /// Sampling temperature for the requested mode.
    pub fn temperature_for(&self, live_mode: bool) -> f32 {
        if live_mode {
            self.config.live_temperature
        } else {
            self.config.temperature
        }
    }

    /// Build the request body: instruction, history, new message, mode flags.
    pub fn build_body(&self, request: &ModelRequest) -> Result<GenerateContentRequest, GeminiError> {
        let instruction = build_system_instruction(&self.knowledge, request.live_mode)?;

        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|turn| Content::turn(turn.role, turn.text.clone()))
            .collect();
        contents.push(Content::turn(
            fany_core::types::Role::User,
            request.message.clone(),
        ));

        let tools = if request.web_search {
            vec![Tool::google_search()]
        } else {
            Vec::new()
        };

        Ok(GenerateContentRequest {
            system_instruction: Content::system(instruction),
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature_for(request.live_mode),
            },
            tools,
        })
    }

    /// Send one generation request and surface typed errors.
    pub async fn try_generate(&self, request: &ModelRequest) -> Result<ModelReply, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;
        let model = self.model_for(request.web_search);
        let body = self.build_body(request)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        tracing::debug!(
            model = %model,
            history_len = request.history.len(),
            live_mode = request.live_mode,
            web_search = request.web_search,
            "Sending generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "(unreadable body)".to_string());
            return Err(map_http_error(status.as_u16(), &error_body));
        }

        let json = response.json::<Value>().await?;
        Ok(Self::parse_response(&json))
    }

    /// Extract reply text and grounding citations from a response.
    pub fn parse_response(json: &Value) -> ModelReply {
        let candidate = json.pointer("/candidates/0");

        let text: String = candidate
            .and_then(|c| c.pointer("/content/parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        let sources: Vec<Source> = candidate
            .and_then(|c| c.pointer("/groundingMetadata/groundingChunks"))
            .and_then(Value::as_array)
            .map(|chunks| chunks.iter().filter_map(grounding_source).collect())
            .unwrap_or_default();

        ModelReply {
            text: if text.is_empty() {
                EMPTY_REPLY.to_string()
            } else {
                text
            },
            sources: if sources.is_empty() {
                None
            } else {
                Some(sources)
            },
        }
    }
}

/// A `{web: {uri, title}}` grounding chunk as a citation. Title defaults to the uri.
fn grounding_source(chunk: &Value) -> Option<Source> {
    let web = chunk.get("web")?;
    let uri = web.get("uri").and_then(Value::as_str).filter(|u| !u.is_empty())?;
    let title = web
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(uri);
    Some(Source {
        uri: uri.to_string(),
        title: title.to_string(),
    })
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, GeminiError> {
        match self.try_generate(request).await {
            Ok(reply) => Ok(reply),
            Err(GeminiError::MissingApiKey) => {
                tracing::error!("Gemini API key not found in configuration or environment");
                Ok(ModelReply::text(MISSING_KEY_REPLY))
            }
            Err(e) => {
                tracing::error!(error = %e, "Error calling Gemini API");
                Ok(ModelReply::text(SERVICE_ERROR_REPLY))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HistoryTurn;
    use fany_core::types::Role;
    use serde_json::json;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig::default()).with_api_key(Some("test-key".into()))
    }

    fn request(live_mode: bool, web_search: bool) -> ModelRequest {
        ModelRequest {
            message: "¿Qué es una API?".into(),
            history: vec![
                HistoryTurn {
                    role: Role::User,
                    text: "hola".into(),
                },
                HistoryTurn {
                    role: Role::Model,
                    text: "¡Wepa!".into(),
                },
            ],
            live_mode,
            web_search,
        }
    }

    #[test]
    fn test_model_selection() {
        let c = client();
        assert_eq!(c.model_for(true), "gemini-2.5-flash");
        assert_eq!(c.model_for(false), "gemini-3-pro-preview");
    }

    #[test]
    fn test_temperature_selection() {
        let c = client();
        assert!((c.temperature_for(true) - 0.8).abs() < f32::EPSILON);
        assert!((c.temperature_for(false) - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_body_shape_without_search() {
        let body = serde_json::to_value(client().build_body(&request(false, false)).unwrap()).unwrap();

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "¿Qué es una API?");

        assert!(body["systemInstruction"].get("role").is_none());
        let instruction = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(instruction.contains("Sé concisa pero útil"));

        assert!(body.get("tools").is_none());
        let temp = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_body_shape_with_search_and_live() {
        let body = serde_json::to_value(client().build_body(&request(true, true)).unwrap()).unwrap();
        assert_eq!(body["tools"], json!([{"google_search": {}}]));
        let instruction = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(instruction.contains("LIVE LLAMADA"));
        let temp = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_parse_text_response() {
        let json = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hola, "}, {"text": "mundo"}]}
            }]
        });
        let reply = GeminiClient::parse_response(&json);
        assert_eq!(reply.text, "Hola, mundo");
        assert!(reply.sources.is_none());
    }

    #[test]
    fn test_parse_grounding_sources() {
        let json = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Resultado"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "A"}},
                        {"web": {"uri": "https://b.example"}},
                        {"web": {"title": "sin uri"}},
                        {"retrievedContext": {"uri": "ignored"}}
                    ]
                }
            }]
        });
        let reply = GeminiClient::parse_response(&json);
        let sources = reply.sources.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "A");
        assert_eq!(sources[1].uri, "https://b.example");
        assert_eq!(sources[1].title, "https://b.example");
    }

    #[test]
    fn test_parse_empty_response_uses_fallback_text() {
        let reply = GeminiClient::parse_response(&json!({"candidates": []}));
        assert_eq!(reply.text, EMPTY_REPLY);
        let reply = GeminiClient::parse_response(&json!({}));
        assert_eq!(reply.text, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_missing_key_is_soft() {
        let c = GeminiClient::new(GeminiConfig::default()).with_api_key(None);
        assert!(!c.has_api_key());

        let err = c.try_generate(&request(false, false)).await.unwrap_err();
        assert!(matches!(err, GeminiError::MissingApiKey));

        let reply = c.generate(&request(false, false)).await.unwrap();
        assert_eq!(reply.text, MISSING_KEY_REPLY);
        assert!(reply.sources.is_none());
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let c = GeminiClient::new(GeminiConfig::default()).with_api_key(Some("   ".into()));
        assert!(!c.has_api_key());
    }
}
