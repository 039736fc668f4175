//! Application orchestration for greeting suggestions and image generation.

use crate::ai::{
    mime, ChatService, FallbackImageClient, GeminiChatClient, GeminiImageClient,
    ImageGenerationService, MockChatClient, MockImageGenerationClient, OpenAiChatClient,
    OpenAiImageClient, StableHordeImageClient,
};
use crate::config::{AiProvider, Config};
use crate::models::{GreetingRequest, ImageRequest, ImageResponse};
use crate::{prompts, Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Coordinates the configured text and image providers for proxy actions.
pub struct App {
    chat: Arc<dyn ChatService>,
    image_gen: Arc<dyn ImageGenerationService>,
    options: AppOptions,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub chat: Arc<dyn ChatService>,
    pub image_gen: Arc<dyn ImageGenerationService>,
}

#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub suggestion_count: usize,
    pub enrich_image_prompt: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            suggestion_count: 3,
            enrich_image_prompt: true,
        }
    }
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, options: AppOptions) -> Self {
        Self {
            chat: services.chat,
            image_gen: services.image_gen,
            options,
        }
    }

    /// Construct an app from a validated [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        let chat = Self::build_chat(config, config.text_provider, http_client.clone())?;

        let primary = Self::build_image(config, config.image_provider, http_client.clone())?;
        let image_gen = match config.image_fallback_provider {
            Some(secondary) if secondary != config.image_provider => {
                info!("Image fallback provider: {}", secondary);
                let secondary_client = Self::build_image(config, secondary, http_client)?;
                Arc::new(FallbackImageClient::new(
                    primary,
                    config.image_provider.to_string(),
                    secondary_client,
                    secondary.to_string(),
                )) as Arc<dyn ImageGenerationService>
            }
            Some(secondary) => {
                warn!(
                    "Ignoring IMAGE_FALLBACK_PROVIDER: {} is already the primary image provider",
                    secondary
                );
                primary
            }
            None => primary,
        };

        if !config.enrich_image_prompt {
            info!("Image prompt enrichment disabled");
        }

        Ok(Self::with_services(
            AppServices { chat, image_gen },
            AppOptions {
                suggestion_count: config.suggestion_count,
                enrich_image_prompt: config.enrich_image_prompt,
            },
        ))
    }

    fn build_chat(
        config: &Config,
        provider: AiProvider,
        http_client: reqwest::Client,
    ) -> Result<Arc<dyn ChatService>> {
        let api_key = config.api_key_for_provider(provider)?;
        let client: Arc<dyn ChatService> = match provider {
            AiProvider::Gemini => {
                let model = config.models.gemini_text.clone();
                info!("Text provider: Gemini (model: {})", model);
                Arc::new(GeminiChatClient::new_with_client(api_key, model, http_client))
            }
            AiProvider::OpenAi => {
                let model = config.models.openai_text.clone();
                info!("Text provider: OpenAI (model: {})", model);
                Arc::new(OpenAiChatClient::new_with_client(api_key, model, http_client))
            }
            AiProvider::Mock => {
                info!("Text provider: Mock");
                Arc::new(MockChatClient::new())
            }
            AiProvider::StableHorde => {
                return Err(Error::Config(format!(
                    "{} cannot be used as a text provider",
                    provider
                )));
            }
        };
        Ok(client)
    }

    fn build_image(
        config: &Config,
        provider: AiProvider,
        http_client: reqwest::Client,
    ) -> Result<Arc<dyn ImageGenerationService>> {
        let api_key = config.api_key_for_provider(provider)?;
        let client: Arc<dyn ImageGenerationService> = match provider {
            AiProvider::Gemini => {
                let model = config.models.gemini_image.clone();
                info!("Image provider: Gemini (model: {})", model);
                Arc::new(GeminiImageClient::new_with_client(api_key, model, http_client))
            }
            AiProvider::OpenAi => {
                let model = config.models.openai_image.clone();
                info!("Image provider: OpenAI (model: {})", model);
                Arc::new(OpenAiImageClient::new_with_client(api_key, model, http_client))
            }
            AiProvider::StableHorde => {
                info!(
                    "Image provider: Stable Horde ({} polls every {:?})",
                    config.horde_poll.max_polls, config.horde_poll.interval
                );
                Arc::new(StableHordeImageClient::new_with_client(
                    api_key,
                    config.horde_poll.clone(),
                    http_client,
                ))
            }
            AiProvider::Mock => {
                info!("Image provider: Mock");
                Arc::new(MockImageGenerationClient::new())
            }
        };
        Ok(client)
    }

    /// `getSuggestions`: at most `suggestion_count` non-blank suggestions.
    pub async fn get_suggestions(&self, request: &GreetingRequest) -> Result<Vec<String>> {
        let count = self.options.suggestion_count;
        info!(
            "Generating {} suggestions ({}, {})",
            count, request.message_type, request.theme
        );

        let suggestions = self.chat.generate_suggestions(request, count).await?;
        let suggestions: Vec<String> = suggestions
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(count)
            .collect();

        info!("Generated {} suggestions", suggestions.len());
        Ok(suggestions)
    }

    /// `generateImage`: returns the picture as a base64 data URI.
    pub async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse> {
        if request.message.trim().is_empty() {
            return Err(Error::Validation(
                "Message is required to generate an image".to_string(),
            ));
        }

        let scene = self.scene_for(request).await?;
        let prompt = prompts::image_prompt(&scene, request);
        info!(
            "Generating {} image ({} chars prompt)",
            request.image_style,
            prompt.len()
        );

        let image = self.image_gen.generate_image(&prompt).await?;
        let image_url = mime::to_data_uri(&image);
        info!(
            "Generated image ({} bytes, {})",
            image.bytes.len(),
            mime::resolve_image_mime(&image)
        );

        Ok(ImageResponse { image_url })
    }

    async fn scene_for(&self, request: &ImageRequest) -> Result<String> {
        if !self.options.enrich_image_prompt {
            return Ok(prompts::fallback_scene(request));
        }

        match self.chat.describe_scene(request).await {
            Ok(scene) if !scene.trim().is_empty() => Ok(scene),
            Ok(_) => {
                warn!("Scene enrichment returned nothing, using the message as-is");
                Ok(prompts::fallback_scene(request))
            }
            Err(e) if e.is_safety_rejection() => Err(e),
            Err(e) => {
                warn!("Scene enrichment failed: {}. Using the message as-is", e);
                Ok(prompts::fallback_scene(request))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::TINY_PNG;
    use crate::models::{ImageStyle, MessageType, Theme};
    use pretty_assertions::assert_eq;

    fn app(chat: &MockChatClient, image: &MockImageGenerationClient, options: AppOptions) -> App {
        App::with_services(
            AppServices {
                chat: Arc::new(chat.clone()),
                image_gen: Arc::new(image.clone()),
            },
            options,
        )
    }

    fn image_request(message: &str) -> ImageRequest {
        ImageRequest {
            message: message.to_string(),
            image_style: ImageStyle::Aquarela,
            message_type: MessageType::BomDia,
            theme: Theme::Cristao,
        }
    }

    fn mock_config(extra: &[(&str, &str)]) -> Config {
        // Earlier entries win, so overrides go first.
        let mut vars = extra.to_vec();
        vars.extend([("TEXT_PROVIDER", "mock"), ("IMAGE_PROVIDER", "mock")]);
        Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_suggestions_are_trimmed_and_truncated() {
        let chat = MockChatClient::new().with_suggestions(vec![
            " Bom dia! ".to_string(),
            "".to_string(),
            "Tenha um ótimo dia".to_string(),
            "Sorria".to_string(),
        ]);
        let image = MockImageGenerationClient::new();
        let app = app(
            &chat,
            &image,
            AppOptions {
                suggestion_count: 2,
                ..AppOptions::default()
            },
        );

        let request = GreetingRequest {
            message_type: MessageType::BomDia,
            theme: Theme::Generico,
        };
        let suggestions = app.get_suggestions(&request).await.unwrap();

        assert_eq!(suggestions, vec!["Bom dia!", "Tenha um ótimo dia"]);
    }

    #[tokio::test]
    async fn test_generate_image_uses_enriched_scene() {
        let chat = MockChatClient::new().with_scene_response("A sunrise over hills".to_string());
        let image = MockImageGenerationClient::new();
        let app = app(&chat, &image, AppOptions::default());

        let response = app
            .generate_image(&image_request("Bom dia, que Deus te abençoe"))
            .await
            .unwrap();

        assert!(response.image_url.starts_with("data:image/png;base64,"));
        let (_, bytes) = mime::parse_data_uri(&response.image_url).unwrap();
        assert_eq!(bytes, TINY_PNG);
        assert!(image
            .last_prompt()
            .unwrap()
            .contains("A sunrise over hills"));
    }

    #[tokio::test]
    async fn test_empty_message_fails_before_any_provider_call() {
        let chat = MockChatClient::new();
        let image = MockImageGenerationClient::new();
        let app = app(&chat, &image, AppOptions::default());

        let err = app.generate_image(&image_request("   ")).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(chat.get_call_count(), 0);
        assert_eq!(image.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_enrichment_failure_falls_back_to_message() {
        let chat = MockChatClient::new().with_error("quota exceeded".to_string());
        let image = MockImageGenerationClient::new();
        let app = app(&chat, &image, AppOptions::default());

        app.generate_image(&image_request("Boa noite, amigos"))
            .await
            .unwrap();

        assert!(image.last_prompt().unwrap().contains("Boa noite, amigos"));
    }

    #[tokio::test]
    async fn test_enrichment_safety_rejection_propagates() {
        let chat = MockChatClient::new().with_error("blocked: SAFETY".to_string());
        let image = MockImageGenerationClient::new();
        let app = app(&chat, &image, AppOptions::default());

        let err = app
            .generate_image(&image_request("Bom dia"))
            .await
            .unwrap_err();

        assert!(err.is_safety_rejection());
        assert_eq!(image.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_enrichment_can_be_disabled() {
        let chat = MockChatClient::new();
        let image = MockImageGenerationClient::new();
        let app = app(
            &chat,
            &image,
            AppOptions {
                enrich_image_prompt: false,
                ..AppOptions::default()
            },
        );

        app.generate_image(&image_request("Bom dia")).await.unwrap();

        assert_eq!(chat.get_call_count(), 0);
        assert_eq!(image.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_from_config_with_mock_providers() {
        let config = mock_config(&[("SUGGESTION_COUNT", "2")]);
        let app = App::from_config(&config).unwrap();

        let suggestions = app
            .get_suggestions(&GreetingRequest {
                message_type: MessageType::BoaNoite,
                theme: Theme::Generico,
            })
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn test_from_config_accepts_fallback_provider() {
        let config = mock_config(&[
            ("IMAGE_PROVIDER", "stablehorde"),
            ("IMAGE_FALLBACK_PROVIDER", "mock"),
        ]);
        assert!(App::from_config(&config).is_ok());
    }
}
