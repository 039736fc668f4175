//! AI service integration for greeting suggestions and image generation
//!
//! Each capability is a trait so the proxy can swap providers (Gemini,
//! OpenAI, Stable Horde, or a mock) purely through configuration.

pub mod fallback;
pub mod gemini;
pub mod mime;
pub mod mock;
pub mod openai;
pub mod stable_horde;
pub mod suggestions;

pub use fallback::FallbackImageClient;
pub use gemini::{GeminiChatClient, GeminiImageClient};
pub use mock::{MockChatClient, MockImageGenerationClient};
pub use openai::{OpenAiChatClient, OpenAiImageClient};
pub use stable_horde::StableHordeImageClient;

use crate::models::{GeneratedImage, GreetingRequest, ImageRequest};
use crate::Result;
use async_trait::async_trait;

/// Text-generation capability.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Returns up to `count` greeting suggestions for the request.
    async fn generate_suggestions(
        &self,
        request: &GreetingRequest,
        count: usize,
    ) -> Result<Vec<String>>;

    /// Turns a (Portuguese) greeting into a short English scene description
    /// for an image model.
    async fn describe_scene(&self, request: &ImageRequest) -> Result<String>;
}

/// Image-generation capability.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;
}

/// Fetches an image that a provider returned by URL, keeping the
/// server-declared content type.
pub(crate) async fn download_image(
    client: &reqwest::Client,
    url: &str,
    timeout: std::time::Duration,
) -> Result<GeneratedImage> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;

    let declared = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?.to_vec();

    Ok(match declared {
        Some(mime) => GeneratedImage::new(bytes).with_declared_mime(mime),
        None => GeneratedImage::new(bytes),
    })
}
