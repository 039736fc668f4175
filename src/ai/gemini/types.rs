//! Shared Gemini payload types used by the chat and image modules.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Gemini content container used in both requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Option<&str>, text: String) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part::Text { text }],
        }
    }
}

/// Untagged union of text and inline media content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload carrying generated images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Top-level `generateContent` response envelope.
///
/// Blocked prompts come back with no candidates and a `promptFeedback`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

/// Candidate completion item returned by Gemini.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
];

impl GenerateContentResponse {
    /// Fails when Gemini refused the prompt or cut the answer for policy reasons.
    pub fn ensure_not_blocked(&self) -> Result<()> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(Error::AiProvider(format!(
                "Gemini blocked the prompt (SAFETY): {}",
                reason
            )));
        }

        if let Some(reason) = self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
        {
            return Err(Error::AiProvider(format!(
                "Gemini stopped generation (SAFETY): {}",
                reason
            )));
        }

        Ok(())
    }

    fn first_parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    pub fn first_text(&self) -> Option<String> {
        self.first_parts().find_map(|p| match p {
            Part::Text { text } => Some(text.clone()),
            Part::InlineData { .. } => None,
        })
    }

    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.first_parts().find_map(|p| match p {
            Part::InlineData { inline_data } => Some(inline_data),
            Part::Text { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_prompt_feedback_block_is_safety_error() {
        let response = parse(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }));

        let err = response.ensure_not_blocked().unwrap_err();
        assert!(err.is_safety_rejection());
    }

    #[test]
    fn test_finish_reason_block_is_safety_error() {
        let response = parse(serde_json::json!({
            "candidates": [{ "finishReason": "IMAGE_SAFETY" }]
        }));

        assert!(response.ensure_not_blocked().unwrap_err().is_safety_rejection());
        assert!(response.first_text().is_none());
    }

    #[test]
    fn test_normal_stop_is_not_blocked() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "ok" }] },
                "finishReason": "STOP"
            }]
        }));

        response.ensure_not_blocked().unwrap();
        assert_eq!(response.first_text().as_deref(), Some("ok"));
    }

    #[test]
    fn test_inline_data_found_after_text_part() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your image" },
                        { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                    ]
                }
            }]
        }));

        let inline = response.first_inline_data().unwrap();
        assert_eq!(inline.mime_type, "image/png");
    }
}
