//! Runtime configuration loaded from the environment (and `.env`).

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Anonymous Stable Horde key; works without an account, at the lowest priority.
pub const STABLE_HORDE_ANONYMOUS_KEY: &str = "0000000000";

const MAX_SUGGESTION_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Gemini,
    OpenAi,
    StableHorde,
    Mock,
}

impl AiProvider {
    pub fn supports_text(&self) -> bool {
        !matches!(self, AiProvider::StableHorde)
    }
}

impl FromStr for AiProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(AiProvider::Gemini),
            "openai" => Ok(AiProvider::OpenAi),
            "stablehorde" | "stable_horde" | "horde" => Ok(AiProvider::StableHorde),
            "mock" => Ok(AiProvider::Mock),
            other => Err(Error::Config(format!("Unknown AI provider '{}'", other))),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AiProvider::Gemini => "Gemini",
            AiProvider::OpenAi => "OpenAI",
            AiProvider::StableHorde => "Stable Horde",
            AiProvider::Mock => "Mock",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub gemini_text: String,
    pub gemini_image: String,
    pub openai_text: String,
    pub openai_image: String,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_polls: usize,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_polls: 36,
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub text_provider: AiProvider,
    pub image_provider: AiProvider,
    pub image_fallback_provider: Option<AiProvider>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub stable_horde_api_key: String,
    pub models: ModelConfig,
    pub suggestion_count: usize,
    pub enrich_image_prompt: bool,
    pub horde_poll: PollConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let text_provider: AiProvider = get_or("TEXT_PROVIDER", "gemini").parse()?;
        let image_provider: AiProvider = get_or("IMAGE_PROVIDER", "gemini").parse()?;
        let image_fallback_provider = get("IMAGE_FALLBACK_PROVIDER")
            .map(|v| v.parse::<AiProvider>())
            .transpose()?;

        if !text_provider.supports_text() {
            return Err(Error::Config(format!(
                "{} cannot be used as TEXT_PROVIDER",
                text_provider
            )));
        }

        let suggestion_count = parse_number("SUGGESTION_COUNT", get_or("SUGGESTION_COUNT", "3"))?;
        if !(1..=MAX_SUGGESTION_COUNT).contains(&suggestion_count) {
            return Err(Error::Config(format!(
                "SUGGESTION_COUNT must be between 1 and {}",
                MAX_SUGGESTION_COUNT
            )));
        }

        let defaults = PollConfig::default();
        let horde_poll = PollConfig {
            max_polls: parse_number(
                "HORDE_MAX_POLLS",
                get_or("HORDE_MAX_POLLS", &defaults.max_polls.to_string()),
            )?,
            interval: Duration::from_secs(parse_number(
                "HORDE_POLL_INTERVAL_SECS",
                get_or(
                    "HORDE_POLL_INTERVAL_SECS",
                    &defaults.interval.as_secs().to_string(),
                ),
            )?),
        };

        let config = Self {
            host: get_or("HOST", "0.0.0.0"),
            port: parse_number("PORT", get_or("PORT", "3000"))?,
            text_provider,
            image_provider,
            image_fallback_provider,
            gemini_api_key: get("GEMINI_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            stable_horde_api_key: get_or("STABLE_HORDE_API_KEY", STABLE_HORDE_ANONYMOUS_KEY),
            models: ModelConfig {
                gemini_text: get_or("GEMINI_TEXT_MODEL", "gemini-2.5-flash"),
                gemini_image: get_or("GEMINI_IMAGE_MODEL", "gemini-2.5-flash-image"),
                openai_text: get_or("OPENAI_TEXT_MODEL", "gpt-4o-mini"),
                openai_image: get_or("OPENAI_IMAGE_MODEL", "gpt-image-1"),
            },
            suggestion_count,
            enrich_image_prompt: parse_bool(
                "ENRICH_IMAGE_PROMPT",
                &get_or("ENRICH_IMAGE_PROMPT", "true"),
            )?,
            horde_poll,
        };

        for provider in [Some(text_provider), Some(image_provider), image_fallback_provider]
            .into_iter()
            .flatten()
        {
            config.api_key_for_provider(provider)?;
        }

        Ok(config)
    }

    /// Returns the credential the given provider needs, failing when it is absent.
    pub fn api_key_for_provider(&self, provider: AiProvider) -> Result<String> {
        let missing = |name: &str| Error::Config(format!("{} not set", name));
        match provider {
            AiProvider::Gemini => self
                .gemini_api_key
                .clone()
                .ok_or_else(|| missing("GEMINI_API_KEY")),
            AiProvider::OpenAi => self
                .openai_api_key
                .clone()
                .ok_or_else(|| missing("OPENAI_API_KEY")),
            AiProvider::StableHorde => Ok(self.stable_horde_api_key.clone()),
            AiProvider::Mock => Ok(String::new()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T: FromStr>(key: &str, value: String) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}
