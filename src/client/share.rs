//! Share planning: decides how the host platform should share a greeting.
//!
//! The plan is data; carrying it out (native share sheet, clipboard) is the
//! host's job.

use super::contacts::phone_digits;
use crate::ai::mime;
use crate::{Error, Result};

pub const SHARE_FILE_STEM: &str = "mensagem";

const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// What the host platform can do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShareCapabilities {
    pub native_share: bool,
    pub share_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharePlan {
    /// Native share sheet with the image attached.
    NativeWithFile { file: ImageFile, text: String },
    /// Native share sheet, text only.
    NativeText { text: String },
    /// No native sharing: the user copies the image and the text separately.
    ManualCopy {
        image_url: Option<String>,
        text: String,
    },
}

pub fn plan_share(
    message: &str,
    image_url: Option<&str>,
    capabilities: ShareCapabilities,
) -> Result<SharePlan> {
    let text = message.trim().to_string();
    if text.is_empty() && image_url.is_none() {
        return Err(Error::Validation("Nothing to share yet".to_string()));
    }

    if capabilities.native_share && capabilities.share_files {
        if let Some(url) = image_url {
            let (mime_type, bytes) = mime::parse_data_uri(url)?;
            let file = ImageFile {
                name: format!(
                    "{}.{}",
                    SHARE_FILE_STEM,
                    mime::extension_for_mime(&mime_type)
                ),
                mime: mime_type,
                bytes,
            };
            return Ok(SharePlan::NativeWithFile { file, text });
        }
    }

    if capabilities.native_share {
        return Ok(SharePlan::NativeText { text });
    }

    Ok(SharePlan::ManualCopy {
        image_url: image_url.map(str::to_string),
        text,
    })
}

/// `https://wa.me/<digits>?text=<message>` deep link for a contact.
pub fn whatsapp_link(phone: &str, message: &str) -> Result<String> {
    let digits = phone_digits(phone);
    if digits.is_empty() {
        return Err(Error::Validation(format!(
            "'{}' is not a valid phone number",
            phone
        )));
    }

    Ok(format!(
        "{}/{}?text={}",
        WHATSAPP_BASE_URL,
        digits,
        urlencoding::encode(message.trim())
    ))
}
