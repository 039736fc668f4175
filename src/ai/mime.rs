use crate::models::GeneratedImage;
use crate::{Error, Result};
use base64::Engine as _;

pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        _ => None,
    }
}

/// Picks the MIME type for an image: sniffed bytes first, then the
/// provider-declared type, then PNG.
pub fn resolve_image_mime(image: &GeneratedImage) -> String {
    if let Some(mime) = detect_image_mime(&image.bytes) {
        return mime.to_string();
    }

    match image.declared_mime.as_deref() {
        Some(declared) if declared.starts_with("image/") => declared.to_string(),
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &image.bytes[..image.bytes.len().min(4)]
            );
            "image/png".to_string()
        }
    }
}

pub fn to_data_uri(image: &GeneratedImage) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
    format!("data:{};base64,{}", resolve_image_mime(image), encoded)
}

/// Splits a `data:<mime>;base64,<payload>` URI into its MIME type and bytes.
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidResponse("Image URL is not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidResponse("Data URI has no payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::InvalidResponse("Data URI is not base64 encoded".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::InvalidResponse(format!("Failed to decode data URI: {}", e)))?;

    Ok((mime.to_string(), bytes))
}

/// File extension conventionally used for an image MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
