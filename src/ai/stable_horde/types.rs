//! Stable Horde v2 payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct AsyncGenerationRequest {
    pub prompt: String,
    pub params: GenerationParams,
    pub nsfw: bool,
    pub censor_nsfw: bool,
    /// Ask for an R2 download URL instead of inline base64.
    pub r2: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerationParams {
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub n: u32,
    pub sampler_name: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            steps: 25,
            n: 1,
            sampler_name: "k_euler_a".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AsyncGenerationResponse {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Lightweight job status from `/generate/check/{id}`.
#[derive(Debug, Deserialize)]
pub struct JobCheck {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub faulted: bool,
    #[serde(default = "default_true")]
    pub is_possible: bool,
    #[serde(default)]
    pub wait_time: u64,
    #[serde(default)]
    pub queue_position: u64,
}

fn default_true() -> bool {
    true
}

/// Full job status from `/generate/status/{id}`.
#[derive(Debug, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub generations: Vec<Generation>,
    #[serde(default)]
    pub faulted: bool,
}

#[derive(Debug, Deserialize)]
pub struct Generation {
    /// Either a download URL (with `r2`) or base64 WebP data.
    pub img: String,
    #[serde(default)]
    pub censored: bool,
}
