//! Data models and structures
//!
//! Defines the greeting vocabulary, the proxy wire envelope and the
//! in-memory contact record shared by the proxy and the client library.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageType {
    #[serde(rename = "Bom dia")]
    BomDia,
    #[serde(rename = "Boa noite")]
    BoaNoite,
}

impl MessageType {
    pub const ALL: [MessageType; 2] = [MessageType::BomDia, MessageType::BoaNoite];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::BomDia => "Bom dia",
            MessageType::BoaNoite => "Boa noite",
        }
    }

    /// Time-of-day hint used when describing the scene to an image model.
    pub fn scene_hint(&self) -> &'static str {
        match self {
            MessageType::BomDia => "morning light, sunrise, fresh and hopeful atmosphere",
            MessageType::BoaNoite => "night sky, moonlight, calm and peaceful atmosphere",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Theme {
    #[serde(rename = "Genérico")]
    Generico,
    #[serde(rename = "Cristão")]
    Cristao,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Generico, Theme::Cristao];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Generico => "Genérico",
            Theme::Cristao => "Cristão",
        }
    }

    pub fn scene_hint(&self) -> &'static str {
        match self {
            Theme::Generico => "nature, flowers, warm and friendly elements",
            Theme::Cristao => "subtle christian symbolism, soft divine light, serene faith",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ImageStyle {
    #[default]
    #[serde(rename = "Fotográfico")]
    Fotografico,
    #[serde(rename = "Aquarela")]
    Aquarela,
    #[serde(rename = "Pintura a Óleo")]
    PinturaAOleo,
    #[serde(rename = "Desenho Animado")]
    DesenhoAnimado,
    #[serde(rename = "Arte Digital")]
    ArteDigital,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 5] = [
        ImageStyle::Fotografico,
        ImageStyle::Aquarela,
        ImageStyle::PinturaAOleo,
        ImageStyle::DesenhoAnimado,
        ImageStyle::ArteDigital,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStyle::Fotografico => "Fotográfico",
            ImageStyle::Aquarela => "Aquarela",
            ImageStyle::PinturaAOleo => "Pintura a Óleo",
            ImageStyle::DesenhoAnimado => "Desenho Animado",
            ImageStyle::ArteDigital => "Arte Digital",
        }
    }

    /// English art direction handed to the image model.
    pub fn art_direction(&self) -> &'static str {
        match self {
            ImageStyle::Fotografico => "photorealistic, high detail, natural lighting, 35mm photo",
            ImageStyle::Aquarela => "delicate watercolor painting, soft washes, paper texture",
            ImageStyle::PinturaAOleo => "classic oil painting, visible brush strokes, rich colors",
            ImageStyle::DesenhoAnimado => {
                "friendly cartoon illustration, clean outlines, bright colors"
            }
            ImageStyle::ArteDigital => "polished digital art, vibrant colors, soft glow",
        }
    }
}

/// `Display` and `FromStr` through the Portuguese wire names.
macro_rules! wire_name {
    ($($ty:ident),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                $ty::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| {
                        let options: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        crate::Error::Validation(format!(
                            "Invalid {} '{}'. Expected one of: {}",
                            stringify!($ty),
                            s,
                            options.join(", ")
                        ))
                    })
            }
        })*
    };
}

wire_name!(MessageType, Theme, ImageStyle);

/// Action names accepted by the proxy envelope.
pub mod actions {
    pub const GET_SUGGESTIONS: &str = "getSuggestions";
    pub const GENERATE_IMAGE: &str = "generateImage";
}

/// Request envelope posted to the proxy endpoint.
///
/// Both fields are optional on the wire so that a missing one can be
/// reported as a client error instead of a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ProxyRequest {
    pub fn new(action: &str, payload: impl Serialize) -> crate::Result<Self> {
        Ok(Self {
            action: Some(action.to_string()),
            payload: Some(serde_json::to_value(payload)?),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GreetingRequest {
    pub message_type: MessageType,
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub message: String,
    pub image_style: ImageStyle,
    pub message_type: MessageType,
    pub theme: Theme,
}

impl ImageRequest {
    pub fn greeting(&self) -> GreetingRequest {
        GreetingRequest {
            message_type: self.message_type,
            theme: self.theme,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Raw image returned by an image provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    /// MIME type declared by the provider, when it sent one.
    pub declared_mime: Option<String>,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            declared_mime: None,
        }
    }

    pub fn with_declared_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_greeting_request_uses_portuguese_wire_names() {
        let request = GreetingRequest {
            message_type: MessageType::BoaNoite,
            theme: Theme::Cristao,
        };

        let json = serde_json::to_value(request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "messageType": "Boa noite", "theme": "Cristão" })
        );
    }

    #[test]
    fn test_image_request_deserializes_from_camel_case() {
        let request: ImageRequest = serde_json::from_value(serde_json::json!({
            "message": "Bom dia, família!",
            "imageStyle": "Pintura a Óleo",
            "messageType": "Bom dia",
            "theme": "Genérico"
        }))
        .unwrap();

        assert_eq!(request.image_style, ImageStyle::PinturaAOleo);
        assert_eq!(request.greeting().message_type, MessageType::BomDia);
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        let result: std::result::Result<ImageStyle, _> =
            serde_json::from_value(serde_json::json!("Cubismo"));
        assert!(result.is_err());
    }

    #[test]
    fn test_display_matches_wire_name() {
        for style in ImageStyle::ALL {
            let wire = serde_json::to_value(style).unwrap();
            assert_eq!(wire, serde_json::Value::String(style.to_string()));
        }
    }

    #[test]
    fn test_from_str_accepts_wire_names() {
        assert_eq!("boa noite".parse::<MessageType>().unwrap(), MessageType::BoaNoite);
        assert_eq!("Cristão".parse::<Theme>().unwrap(), Theme::Cristao);

        let err = "Cubismo".parse::<ImageStyle>().unwrap_err();
        assert!(err.to_string().contains("Arte Digital"));
    }

    #[test]
    fn test_envelope_missing_fields_decode_as_none() {
        let request: ProxyRequest =
            serde_json::from_value(serde_json::json!({ "action": "getSuggestions" })).unwrap();
        assert_eq!(request.action.as_deref(), Some("getSuggestions"));
        assert!(request.payload.is_none());
    }
}
