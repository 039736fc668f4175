use super::{ChatService, ImageGenerationService};
use crate::models::{GeneratedImage, GreetingRequest, ImageRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A 1x1 PNG returned when no image response is configured.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Scripted [`ChatService`]; clones share state so tests can keep a probe.
#[derive(Clone, Default)]
pub struct MockChatClient {
    suggestion_responses: Arc<Mutex<Vec<Vec<String>>>>,
    scene_responses: Arc<Mutex<Vec<String>>>,
    error: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a scripted suggestion set, returned verbatim (not truncated).
    pub fn with_suggestions(self, suggestions: Vec<String>) -> Self {
        self.suggestion_responses.lock().unwrap().push(suggestions);
        self
    }

    pub fn with_scene_response(self, scene: String) -> Self {
        self.scene_responses.lock().unwrap().push(scene);
        self
    }

    /// Every call fails with `Error::AiProvider(message)`.
    pub fn with_error(self, message: String) -> Self {
        *self.error.lock().unwrap() = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    fn next_call(&self) -> Result<usize> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        match self.error.lock().unwrap().as_ref() {
            Some(message) => Err(Error::AiProvider(message.clone())),
            None => Ok(*count),
        }
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn generate_suggestions(
        &self,
        request: &GreetingRequest,
        count: usize,
    ) -> Result<Vec<String>> {
        let call = self.next_call()?;

        let responses = self.suggestion_responses.lock().unwrap();
        if responses.is_empty() {
            Ok((1..=count)
                .map(|i| {
                    format!(
                        "{}! Mensagem {} ({})",
                        request.message_type, i, request.theme
                    )
                })
                .collect())
        } else {
            let index = (call - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }

    async fn describe_scene(&self, request: &ImageRequest) -> Result<String> {
        let call = self.next_call()?;

        let responses = self.scene_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(format!(
                "A peaceful scene illustrating \"{}\"",
                request.message.trim()
            ))
        } else {
            let index = (call - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

/// Scripted [`ImageGenerationService`] that records the prompts it receives.
#[derive(Clone, Default)]
pub struct MockImageGenerationClient {
    image_responses: Arc<Mutex<Vec<Vec<u8>>>>,
    error: Arc<Mutex<Option<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.image_responses.lock().unwrap().push(response);
        self
    }

    /// Every call fails with `Error::AiProvider(message)`.
    pub fn with_error(self, message: String) -> Self {
        *self.error.lock().unwrap() = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if let Some(message) = self.error.lock().unwrap().as_ref() {
            return Err(Error::AiProvider(message.clone()));
        }

        let responses = self.image_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(GeneratedImage::new(TINY_PNG.to_vec()))
        } else {
            let index = (call - 1) % responses.len();
            Ok(GeneratedImage::new(responses[index].clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageStyle, MessageType, Theme};

    fn greeting() -> GreetingRequest {
        GreetingRequest {
            message_type: MessageType::BomDia,
            theme: Theme::Generico,
        }
    }

    #[tokio::test]
    async fn test_mock_chat_default_suggestions_match_count() {
        let client = MockChatClient::new();

        let suggestions = client.generate_suggestions(&greeting(), 3).await.unwrap();
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions[0].starts_with("Bom dia!"));
    }

    #[tokio::test]
    async fn test_mock_chat_custom_responses_cycle() {
        let client = MockChatClient::new()
            .with_suggestions(vec!["um".to_string()])
            .with_suggestions(vec!["dois".to_string()]);

        assert_eq!(
            client.generate_suggestions(&greeting(), 3).await.unwrap(),
            vec!["um"]
        );
        assert_eq!(
            client.generate_suggestions(&greeting(), 3).await.unwrap(),
            vec!["dois"]
        );
        // Should cycle back
        assert_eq!(
            client.generate_suggestions(&greeting(), 3).await.unwrap(),
            vec!["um"]
        );
    }

    #[tokio::test]
    async fn test_mock_chat_error_counts_call() {
        let client = MockChatClient::new().with_error("boom".to_string());
        let probe = client.clone();

        let request = ImageRequest {
            message: "Oi".to_string(),
            image_style: ImageStyle::Aquarela,
            message_type: MessageType::BoaNoite,
            theme: Theme::Cristao,
        };

        let err = client.describe_scene(&request).await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
        assert_eq!(probe.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_image_records_prompts() {
        let client = MockImageGenerationClient::new();

        let image = client.generate_image("a sunrise").await.unwrap();
        assert_eq!(image.bytes, TINY_PNG);
        assert_eq!(client.get_call_count(), 1);
        assert_eq!(client.last_prompt().as_deref(), Some("a sunrise"));
    }
}
