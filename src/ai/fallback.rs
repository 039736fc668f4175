use super::ImageGenerationService;
use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Tries a primary image provider and, when it fails for a reason other than
/// a safety rejection, gives a secondary provider exactly one attempt.
pub struct FallbackImageClient {
    primary: Arc<dyn ImageGenerationService>,
    secondary: Arc<dyn ImageGenerationService>,
    primary_name: String,
    secondary_name: String,
}

impl FallbackImageClient {
    pub fn new(
        primary: Arc<dyn ImageGenerationService>,
        primary_name: impl Into<String>,
        secondary: Arc<dyn ImageGenerationService>,
        secondary_name: impl Into<String>,
    ) -> Self {
        Self {
            primary,
            secondary,
            primary_name: primary_name.into(),
            secondary_name: secondary_name.into(),
        }
    }
}

#[async_trait]
impl ImageGenerationService for FallbackImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        match self.primary.generate_image(prompt).await {
            Ok(image) => Ok(image),
            Err(e) if e.is_safety_rejection() => Err(e),
            Err(e) => {
                tracing::warn!(
                    "{} image generation failed: {}. Falling back to {}",
                    self.primary_name,
                    e,
                    self.secondary_name
                );
                self.secondary.generate_image(prompt).await
            }
        }
    }
}
