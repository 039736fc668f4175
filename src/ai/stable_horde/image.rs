use super::client::HordeHttpClient;
use super::types::{
    AsyncGenerationRequest, AsyncGenerationResponse, GenerationParams, JobCheck, JobStatus,
};
use crate::ai::ImageGenerationService;
use crate::config::PollConfig;
use crate::models::GeneratedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, RetryIf};

/// Outcome of a single job check.
enum PollError {
    Pending,
    Failed(Error),
}

pub struct StableHordeImageClient {
    http: HordeHttpClient,
    poll: PollConfig,
}

impl StableHordeImageClient {
    pub fn new(api_key: String, poll: PollConfig) -> Self {
        Self::new_with_client(api_key, poll, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, poll: PollConfig, client: reqwest::Client) -> Self {
        Self {
            http: HordeHttpClient::new_with_client(api_key, Duration::from_secs(30), client),
            poll,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    /// Polls the job at a fixed interval, at most `max_polls` times.
    async fn wait_for_job(&self, id: &str) -> Result<()> {
        let strategy =
            FixedInterval::new(self.poll.interval).take(self.poll.max_polls.saturating_sub(1));
        let http = &self.http;
        let check_path = format!("/api/v2/generate/check/{}", id);
        let check_path = check_path.as_str();

        let outcome = RetryIf::spawn(
            strategy,
            move || async move {
                let check: JobCheck = http.get(check_path).await.map_err(PollError::Failed)?;

                if check.faulted {
                    return Err(PollError::Failed(Error::AiProvider(
                        "Stable Horde job faulted".to_string(),
                    )));
                }
                if !check.is_possible {
                    return Err(PollError::Failed(Error::ServiceUnavailable(
                        "No Stable Horde worker can currently run this job".to_string(),
                    )));
                }
                if check.done {
                    return Ok(());
                }

                tracing::debug!(
                    "Stable Horde job pending (queue position {}, ~{}s left)",
                    check.queue_position,
                    check.wait_time
                );
                Err(PollError::Pending)
            },
            |e: &PollError| matches!(e, PollError::Pending),
        )
        .await;

        match outcome {
            Ok(()) => Ok(()),
            Err(PollError::Pending) => {
                tracing::error!(
                    "Stable Horde job {} not finished after {} polls",
                    id,
                    self.poll.max_polls
                );
                Err(Error::Timeout(format!(
                    "Image generation did not finish after {} checks",
                    self.poll.max_polls
                )))
            }
            Err(PollError::Failed(e)) => Err(e),
        }
    }
}

#[async_trait]
impl ImageGenerationService for StableHordeImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = AsyncGenerationRequest {
            prompt: prompt.to_string(),
            params: GenerationParams::default(),
            nsfw: false,
            censor_nsfw: true,
            r2: true,
        };

        let job: AsyncGenerationResponse =
            self.http.post("/api/v2/generate/async", &request).await?;
        tracing::info!(
            "Submitted Stable Horde job {}{}",
            job.id,
            job.message
                .as_deref()
                .map(|m| format!(" ({})", m))
                .unwrap_or_default()
        );

        self.wait_for_job(&job.id).await?;

        let status: JobStatus = self
            .http
            .get(&format!("/api/v2/generate/status/{}", job.id))
            .await?;

        if status.faulted {
            return Err(Error::AiProvider("Stable Horde job faulted".to_string()));
        }

        let generation = status.generations.into_iter().next().ok_or_else(|| {
            Error::AiProvider("Stable Horde job finished without an image".to_string())
        })?;

        if generation.censored {
            return Err(Error::ContentPolicy(
                "Stable Horde censored the generated image (safety filter)".to_string(),
            ));
        }

        if generation.img.starts_with("http://") || generation.img.starts_with("https://") {
            self.http.download(&generation.img).await
        } else {
            use base64::Engine as _;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(generation.img.trim())
                .map_err(|e| {
                    Error::AiProvider(format!("Failed to decode Stable Horde image: {}", e))
                })?;
            Ok(GeneratedImage::new(bytes).with_declared_mime("image/webp"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_poll(max_polls: usize) -> PollConfig {
        PollConfig {
            max_polls,
            interval: Duration::from_millis(10),
        }
    }

    fn make_client(server: &MockServer, max_polls: usize) -> StableHordeImageClient {
        StableHordeImageClient::new("horde-key".to_string(), fast_poll(max_polls))
            .with_base_url(server.uri())
    }

    async fn mount_submit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v2/generate/async"))
            .and(header("apikey", "horde-key"))
            .and(body_string_contains("\"censor_nsfw\":true"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "id": "job-1",
                "kudos": 10.0
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn check(done: bool) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "done": done,
            "faulted": false,
            "is_possible": true,
            "wait_time": 3,
            "queue_position": 1
        }))
    }

    #[tokio::test]
    async fn test_polls_until_done_and_downloads_image() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v2/generate/check/job-1"))
            .respond_with(check(false))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/generate/check/job-1"))
            .respond_with(check(true))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v2/generate/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "done": true,
                "faulted": false,
                "generations": [{
                    "img": format!("{}/r2/job-1.webp", server.uri()),
                    "censored": false
                }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/r2/job-1.webp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/webp")
                    .set_body_bytes(vec![1, 2, 3]),
            )
            .mount(&server)
            .await;

        let client = make_client(&server, 5);

        let image = client.generate_image("a sunrise").await.unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3]);
        assert_eq!(image.declared_mime.as_deref(), Some("image/webp"));
    }

    #[tokio::test]
    async fn test_times_out_after_max_polls() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v2/generate/check/job-1"))
            .respond_with(check(false))
            .expect(3)
            .mount(&server)
            .await;

        let client = make_client(&server, 3);

        let err = client.generate_image("a sunrise").await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn test_impossible_job_is_service_unavailable() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v2/generate/check/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "done": false,
                "faulted": false,
                "is_possible": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, 5);

        let err = client.generate_image("a sunrise").await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_inline_base64_image_is_decoded() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v2/generate/check/job-1"))
            .respond_with(check(true))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/generate/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "generations": [{ "img": "AQID" }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, 5);

        let image = client.generate_image("a sunrise").await.unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3]);
        assert_eq!(image.declared_mime.as_deref(), Some("image/webp"));
    }

    #[tokio::test]
    async fn test_censored_generation_is_content_policy() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v2/generate/check/job-1"))
            .respond_with(check(true))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/generate/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "generations": [{ "img": "AQID", "censored": true }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, 5);

        let err = client.generate_image("a sunrise").await.unwrap_err();
        assert!(matches!(err, Error::ContentPolicy(_)));
    }

    #[tokio::test]
    async fn test_maintenance_is_service_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/generate/async"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance mode"))
            .mount(&server)
            .await;

        let client = make_client(&server, 5);

        let err = client.generate_image("a sunrise").await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }
}
