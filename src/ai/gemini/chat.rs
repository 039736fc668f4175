use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse};
use crate::ai::suggestions::parse_suggestions;
use crate::ai::ChatService;
use crate::models::{GreetingRequest, ImageRequest};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest {
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: Option<ChatGenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

pub struct GeminiChatClient {
    http: GeminiHttpClient,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(30),
                client,
            ),
        }
    }

    async fn generate_text(
        &self,
        system: &str,
        user: String,
        generation_config: ChatGenerationConfig,
    ) -> Result<String> {
        let request = ChatRequest {
            system_instruction: Some(Content::text(None, system.to_string())),
            contents: vec![Content::text(Some("user"), user)],
            generation_config: Some(generation_config),
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;
        response.ensure_not_blocked()?;

        response
            .first_text()
            .ok_or_else(|| Error::AiProvider("No text in Gemini chat response".to_string()))
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiChatClient);

#[async_trait]
impl ChatService for GeminiChatClient {
    async fn generate_suggestions(
        &self,
        request: &GreetingRequest,
        count: usize,
    ) -> Result<Vec<String>> {
        let text = self
            .generate_text(
                prompts::SUGGESTIONS_SYSTEM,
                prompts::suggestions_user(request, count),
                ChatGenerationConfig {
                    max_output_tokens: Some(2048),
                    temperature: Some(0.9),
                    response_mime_type: Some("application/json".to_string()),
                    response_schema: Some(serde_json::json!({
                        "type": "ARRAY",
                        "items": { "type": "STRING" }
                    })),
                },
            )
            .await?;

        parse_suggestions(&text, count)
    }

    async fn describe_scene(&self, request: &ImageRequest) -> Result<String> {
        let text = self
            .generate_text(
                prompts::SCENE_SYSTEM,
                prompts::scene_user(request),
                ChatGenerationConfig {
                    max_output_tokens: Some(512),
                    temperature: None,
                    response_mime_type: None,
                    response_schema: None,
                },
            )
            .await?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use crate::models::{ImageStyle, MessageType, Theme};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::Mock;
    use wiremock::{MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    fn make_client(server: &MockServer, api_key: &str, model: &str) -> GeminiChatClient {
        GeminiChatClient::new(api_key.to_string(), model.to_string()).with_base_url(server.uri())
    }

    fn greeting() -> GreetingRequest {
        GreetingRequest {
            message_type: MessageType::BomDia,
            theme: Theme::Generico,
        }
    }

    fn text_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
    }

    #[tokio::test]
    async fn test_generate_suggestions_parses_json_array() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("\"responseMimeType\":\"application/json\""))
            .respond_with(text_response(r#"["msg1", "msg2", "msg3"]"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);

        let suggestions = client.generate_suggestions(&greeting(), 3).await.unwrap();
        assert_eq!(suggestions, vec!["msg1", "msg2", "msg3"]);
    }

    #[tokio::test]
    async fn test_generate_suggestions_embeds_greeting_in_prompt() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_string_contains("Bom dia"))
            .and(body_string_contains("Genérico"))
            .respond_with(text_response("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);

        let suggestions = client.generate_suggestions(&greeting(), 3).await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_generate_suggestions_rejects_prose() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(text_response("Claro! Aqui vão algumas mensagens."))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);

        let err = client
            .generate_suggestions(&greeting(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = make_client(&server, "bad-key", DEFAULT_MODEL);

        let err = client
            .generate_suggestions(&greeting(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_overloaded_model_is_service_unavailable() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(503).set_body_string("model is overloaded"))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", DEFAULT_MODEL);

        let err = client
            .generate_suggestions(&greeting(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_safety_rejection() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", DEFAULT_MODEL);

        let err = client
            .generate_suggestions(&greeting(), 3)
            .await
            .unwrap_err();
        assert!(err.is_safety_rejection());
    }

    #[tokio::test]
    async fn test_describe_scene_trims_text() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_string_contains("Que a paz esteja com você"))
            .respond_with(text_response("  A calm moonlit lake with lilies.\n"))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", DEFAULT_MODEL);
        let request = ImageRequest {
            message: "Que a paz esteja com você".to_string(),
            image_style: ImageStyle::Aquarela,
            message_type: MessageType::BoaNoite,
            theme: Theme::Cristao,
        };

        let scene = client.describe_scene(&request).await.unwrap();
        assert_eq!(scene, "A calm moonlit lake with lilies.");
    }

    #[tokio::test]
    async fn test_generate_strips_models_prefix_from_model_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(text_response("[\"ok\"]"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", "models/gemini-2.5-flash");

        client.generate_suggestions(&greeting(), 3).await.unwrap();
    }
}
