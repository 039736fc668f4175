use crate::models::GeneratedImage;
use crate::{Error, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://stablehorde.net";
const CLIENT_AGENT: &str = concat!(
    "mensageiro-do-bem:",
    env!("CARGO_PKG_VERSION"),
    ":unknown"
);

pub struct HordeHttpClient {
    pub(crate) client: Client,
    api_key: String,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl HordeHttpClient {
    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .timeout(self.timeout)
            .header("apikey", &self.api_key)
            .header("Client-Agent", CLIENT_AGENT)
    }

    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Sending request to Stable Horde: {}", path);

        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Stable Horde: {}", e);
                e
            })?;

        Self::decode(response).await
    }

    pub async fn get<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to poll Stable Horde: {}", e);
                e
            })?;

        Self::decode(response).await
    }

    async fn decode<Resp: DeserializeOwned>(response: reqwest::Response) -> Result<Resp> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            tracing::error!("Stable Horde API error (status {}): {}", status, error_text);
            if status == StatusCode::SERVICE_UNAVAILABLE {
                return Err(Error::ServiceUnavailable(format!(
                    "Stable Horde is under maintenance: {}",
                    error_text
                )));
            }
            return Err(Error::AiProvider(format!(
                "Stable Horde API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Stable Horde response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse Stable Horde response: {}", e))
        })
    }

    /// Fetches a finished image from its R2 download URL (no API key sent).
    pub async fn download(&self, url: &str) -> Result<GeneratedImage> {
        crate::ai::download_image(&self.client, url, self.timeout).await
    }
}
