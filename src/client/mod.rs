//! Client library for the proxy: typed calls plus a headless form controller.

pub mod contacts;
pub mod controller;
pub mod share;

pub use contacts::{ContactBook, DeviceContact};
pub use controller::{FormController, FormState, Outcome};
pub use share::{plan_share, whatsapp_link, ImageFile, ShareCapabilities, SharePlan};

use crate::models::{
    actions, ErrorBody, GreetingRequest, ImageRequest, ImageResponse, ImageStyle, MessageType,
    ProxyRequest, Theme,
};
use crate::proxy::PROXY_PATH;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const EMPTY_MESSAGE_ERROR: &str = "Message is required to generate an image";

/// Covers the longest Stable Horde poll budget plus the download.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(240);

/// The two proxy operations, as seen from a front end.
#[async_trait]
pub trait GreetingApi: Send + Sync {
    async fn get_greeting_suggestions(
        &self,
        message_type: MessageType,
        theme: Theme,
    ) -> Result<Vec<String>>;

    /// Returns the generated picture as a `data:` URI.
    async fn generate_image_from_message(
        &self,
        message: &str,
        image_style: ImageStyle,
        message_type: MessageType,
        theme: Theme,
    ) -> Result<String>;
}

pub struct ProxyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ProxyClient {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: &str) -> Self {
        Self::new_with_client(base_url, reqwest::Client::new())
    }

    pub fn new_with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), PROXY_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, request: &ProxyRequest, expected: &str) -> Result<T> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach proxy at {}: {}", self.endpoint, e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody { error }) => error,
                Err(_) if body.trim().is_empty() => status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
                Err(_) => body,
            };
            return Err(Error::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Unexpected proxy response: {}\nBody: {}", e, body);
            Error::InvalidResponse(format!("expected {}: {}", expected, e))
        })
    }
}

#[async_trait]
impl GreetingApi for ProxyClient {
    async fn get_greeting_suggestions(
        &self,
        message_type: MessageType,
        theme: Theme,
    ) -> Result<Vec<String>> {
        let request = ProxyRequest::new(
            actions::GET_SUGGESTIONS,
            GreetingRequest {
                message_type,
                theme,
            },
        )?;

        self.call(&request, "a JSON array of suggestions").await
    }

    async fn generate_image_from_message(
        &self,
        message: &str,
        image_style: ImageStyle,
        message_type: MessageType,
        theme: Theme,
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(Error::Validation(EMPTY_MESSAGE_ERROR.to_string()));
        }

        let request = ProxyRequest::new(
            actions::GENERATE_IMAGE,
            ImageRequest {
                message: message.to_string(),
                image_style,
                message_type,
                theme,
            },
        )?;

        let response: ImageResponse = self.call(&request, "an object with imageUrl").await?;
        if !response.image_url.starts_with("data:") {
            return Err(Error::InvalidResponse("imageUrl is not a data URI".to_string()));
        }
        Ok(response.image_url)
    }
}
