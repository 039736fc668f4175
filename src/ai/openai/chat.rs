use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, JsonSchema, ResponseFormat};
use crate::ai::suggestions::parse_suggestions;
use crate::ai::ChatService;
use crate::models::{GreetingRequest, ImageRequest};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAiChatClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, Duration::from_secs(30), client),
            model,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    /// Strict structured output requires an object at the top level, so the
    /// array travels inside `{"suggestions": [...]}`.
    fn suggestions_format() -> ResponseFormat {
        ResponseFormat {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchema {
                name: "greeting_suggestions".to_string(),
                schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "suggestions": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    },
                    "required": ["suggestions"],
                    "additionalProperties": false
                }),
                strict: true,
            },
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: String,
        max_completion_tokens: u32,
        response_format: Option<ResponseFormat>,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", system.to_string()),
                ChatMessage::new("user", user),
            ],
            max_completion_tokens,
            response_format,
        };

        let response = self.http.chat_completion(request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::AiProvider("No response from OpenAI chat API".to_string()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(Error::AiProvider(
                "OpenAI stopped generation for safety reasons (content_filter)".to_string(),
            ));
        }
        if let Some(refusal) = choice.message.refusal {
            return Err(Error::AiProvider(format!(
                "OpenAI refused the request for safety reasons: {}",
                refusal
            )));
        }

        choice
            .message
            .content
            .ok_or_else(|| Error::AiProvider("No text in OpenAI chat response".to_string()))
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    async fn generate_suggestions(
        &self,
        request: &GreetingRequest,
        count: usize,
    ) -> Result<Vec<String>> {
        let text = self
            .complete(
                prompts::SUGGESTIONS_SYSTEM,
                prompts::suggestions_user(request, count),
                2048,
                Some(Self::suggestions_format()),
            )
            .await?;

        parse_suggestions(&text, count)
    }

    async fn describe_scene(&self, request: &ImageRequest) -> Result<String> {
        let text = self
            .complete(
                prompts::SCENE_SYSTEM,
                prompts::scene_user(request),
                512,
                None,
            )
            .await?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageType, Theme};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn greeting() -> GreetingRequest {
        GreetingRequest {
            message_type: MessageType::BoaNoite,
            theme: Theme::Cristao,
        }
    }

    fn chat_response(content: &str, finish_reason: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": finish_reason
            }]
        }))
    }

    #[tokio::test]
    async fn test_generate_suggestions_parses_structured_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_string_contains("\"type\":\"json_schema\""))
            .respond_with(chat_response(
                r#"{"suggestions": ["Boa noite!", "Durma com Deus!", "Paz!"]}"#,
                "stop",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new("test-key".to_string(), "gpt-4o-mini".to_string())
            .with_base_url(server.uri());

        let suggestions = client.generate_suggestions(&greeting(), 3).await.unwrap();
        assert_eq!(suggestions, vec!["Boa noite!", "Durma com Deus!", "Paz!"]);
    }

    #[tokio::test]
    async fn test_generate_sends_configured_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("\"model\":\"custom-model\""))
            .respond_with(chat_response("[]", "stop"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new("key".to_string(), "custom-model".to_string())
            .with_base_url(server.uri());

        client.generate_suggestions(&greeting(), 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_content_filter_is_safety_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(chat_response("", "content_filter"))
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new("key".to_string(), "gpt-4o-mini".to_string())
            .with_base_url(server.uri());

        let err = client
            .generate_suggestions(&greeting(), 3)
            .await
            .unwrap_err();
        assert!(err.is_safety_rejection());
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new("key".to_string(), "gpt-4o-mini".to_string())
            .with_base_url(server.uri());

        let err = client
            .generate_suggestions(&greeting(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
