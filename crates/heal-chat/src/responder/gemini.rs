//! Gemini `generateContent` responder.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Reply, Responder, ResponderConfig, ResponderError};

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Responder backed by the Gemini REST API.
pub struct GeminiResponder {
    config: ResponderConfig,
    api_key: String,
    client: Client,
}

impl GeminiResponder {
    /// Create a responder from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ResponderError::NotConfigured` if no API key is set or the
    /// HTTP client cannot be built.
    pub fn new(config: ResponderConfig) -> Result<Self, ResponderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ResponderError::NotConfigured("missing API key".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| ResponderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.api_key
        )
    }

    fn build_request(&self, persona: &str, history: &[String], message: &str) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if !history.is_empty() {
            let mut transcript = String::from("Earlier in this conversation:\n");
            for turn in history {
                transcript.push_str("- ");
                transcript.push_str(turn);
                transcript.push('\n');
            }
            parts.push(Part { text: transcript });
        }
        parts.push(Part {
            text: message.to_string(),
        });

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: persona.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Responder for GeminiResponder {
    async fn generate(
        &self,
        persona: &str,
        history: &[String],
        message: &str,
    ) -> Result<Reply, ResponderError> {
        let request = self.build_request(persona, history, message);

        tracing::debug!(
            model = %self.config.model,
            history_len = history.len(),
            message_len = message.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| ResponderError::Unreachable(e.without_url().to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ResponderError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Gemini API returned an error");
            return Err(ResponderError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ResponderError::Unreachable(format!("invalid response body: {}", e.without_url())))?;

        if body
            .prompt_feedback
            .as_ref()
            .is_some_and(|feedback| feedback.block_reason.is_some())
        {
            return Err(ResponderError::ContentFiltered);
        }

        let Some(candidate) = body.candidates.into_iter().next() else {
            return Err(ResponderError::EmptyResponse);
        };
        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ResponderError::ContentFiltered);
        }

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(ResponderError::EmptyResponse);
        }

        Ok(Reply {
            text: text.to_string(),
            model: self.config.model.clone(),
        })
    }
}

// =============================================================================
// Gemini API Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn responder(base_url: String) -> GeminiResponder {
        GeminiResponder::new(ResponderConfig {
            api_key: Some("test-key".to_string()),
            base_url,
            ..ResponderConfig::default()
        })
        .unwrap()
    }

    fn endpoint() -> &'static str {
        "/models/gemini-1.5-flash:generateContent"
    }

    #[test]
    fn missing_key_is_not_configured() {
        let result = GeminiResponder::new(ResponderConfig::default());
        assert!(matches!(result, Err(ResponderError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn extracts_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "systemInstruction": { "parts": [{ "text": "be kind" }] },
                "generationConfig": { "topK": 40, "maxOutputTokens": 200 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": " I'm here " }, { "text": "for you." }] },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = responder(server.uri())
            .generate("be kind", &["earlier".to_string()], "hello")
            .await
            .unwrap();

        assert_eq!(reply.text, "I'm here for you.");
        assert_eq!(reply.model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let result = responder(server.uri()).generate("p", &[], "hi").await;
        assert!(matches!(result, Err(ResponderError::RateLimited)));
    }

    #[tokio::test]
    async fn server_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = responder(server.uri()).generate("p", &[], "hi").await;
        assert!(matches!(
            result,
            Err(ResponderError::Rejected { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn safety_block_is_filtered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .mount(&server)
            .await;

        let result = responder(server.uri()).generate("p", &[], "hi").await;
        assert!(matches!(result, Err(ResponderError::ContentFiltered)));
    }

    #[tokio::test]
    async fn no_candidates_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let result = responder(server.uri()).generate("p", &[], "hi").await;
        assert!(matches!(result, Err(ResponderError::EmptyResponse)));
    }

    #[test]
    fn history_becomes_transcript_part() {
        let r = responder("http://unused".to_string());
        let request = r.build_request("persona", &["one".to_string(), "two".to_string()], "now");

        assert_eq!(request.contents.len(), 1);
        let parts = &request.contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(parts[0].text.contains("- one\n- two"));
        assert_eq!(parts[1].text, "now");
        assert_eq!(request.safety_settings.len(), 4);
    }
}
