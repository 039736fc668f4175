//! Headless form controller: the state a greeting form renders, and the
//! actions that change it.

use super::contacts::{ContactBook, DeviceContact};
use super::share::{self, ShareCapabilities, SharePlan};
use super::{GreetingApi, EMPTY_MESSAGE_ERROR};
use crate::models::{Contact, ImageStyle, MessageType, Theme};
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub message_type: MessageType,
    pub theme: Theme,
    pub image_style: ImageStyle,
    pub suggestions: Vec<String>,
    /// Editable draft; seeded with the first suggestion.
    pub message: String,
    pub image_url: Option<String>,
    /// Dismissible error banner.
    pub error: Option<String>,
    pub loading_suggestions: bool,
    pub generating_image: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            message_type: MessageType::BomDia,
            theme: Theme::Generico,
            image_style: ImageStyle::default(),
            suggestions: Vec::new(),
            message: String::new(),
            image_url: None,
            error: None,
            loading_suggestions: false,
            generating_image: false,
        }
    }
}

/// What happened to a request's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer request started first; the response was dropped.
    Stale,
    Failed,
}

pub struct FormController {
    api: Arc<dyn GreetingApi>,
    state: Mutex<FormState>,
    contacts: Mutex<ContactBook>,
    suggestion_seq: AtomicU64,
    image_seq: AtomicU64,
}

/// Text shown in the banner; server errors show the server's own message.
fn banner_text(error: &Error) -> String {
    match error {
        Error::Server { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

impl FormController {
    pub fn new(api: Arc<dyn GreetingApi>) -> Self {
        Self {
            api,
            state: Mutex::new(FormState::default()),
            contacts: Mutex::new(ContactBook::new()),
            suggestion_seq: AtomicU64::new(0),
            image_seq: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> FormState {
        self.state.lock().await.clone()
    }

    /// Initial load: fetch suggestions for the default selection.
    pub async fn load(&self) -> Outcome {
        self.refresh_suggestions().await
    }

    pub async fn select_message_type(&self, message_type: MessageType) -> Outcome {
        self.state.lock().await.message_type = message_type;
        self.refresh_suggestions().await
    }

    pub async fn select_theme(&self, theme: Theme) -> Outcome {
        self.state.lock().await.theme = theme;
        self.refresh_suggestions().await
    }

    pub async fn select_image_style(&self, image_style: ImageStyle) {
        self.state.lock().await.image_style = image_style;
    }

    pub async fn set_message(&self, message: impl Into<String>) {
        self.state.lock().await.message = message.into();
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.error = None;
    }

    /// Fetches suggestions for the current selection. Only the latest
    /// request's response is applied.
    pub async fn refresh_suggestions(&self) -> Outcome {
        let (seq, message_type, theme) = {
            let mut state = self.state.lock().await;
            state.error = None;
            state.loading_suggestions = true;
            let seq = self.suggestion_seq.fetch_add(1, Ordering::SeqCst) + 1;
            (seq, state.message_type, state.theme)
        };

        let result = self.api.get_greeting_suggestions(message_type, theme).await;

        let mut state = self.state.lock().await;
        if self.suggestion_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!("Dropping stale suggestions response #{}", seq);
            return Outcome::Stale;
        }
        state.loading_suggestions = false;

        match result {
            Ok(suggestions) => {
                state.message = suggestions.first().cloned().unwrap_or_default();
                state.suggestions = suggestions;
                Outcome::Applied
            }
            Err(e) => {
                tracing::warn!("Failed to load suggestions: {}", e);
                state.error = Some(banner_text(&e));
                Outcome::Failed
            }
        }
    }

    /// Generates an image for the current draft. An empty draft fails
    /// without calling the proxy.
    pub async fn generate_image(&self) -> Outcome {
        let (seq, message, image_style, message_type, theme) = {
            let mut state = self.state.lock().await;
            state.error = None;

            if state.message.trim().is_empty() {
                state.error = Some(EMPTY_MESSAGE_ERROR.to_string());
                return Outcome::Failed;
            }

            state.generating_image = true;
            state.image_url = None;
            let seq = self.image_seq.fetch_add(1, Ordering::SeqCst) + 1;
            (
                seq,
                state.message.clone(),
                state.image_style,
                state.message_type,
                state.theme,
            )
        };

        let result = self
            .api
            .generate_image_from_message(&message, image_style, message_type, theme)
            .await;

        let mut state = self.state.lock().await;
        if self.image_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!("Dropping stale image response #{}", seq);
            return Outcome::Stale;
        }
        state.generating_image = false;

        match result {
            Ok(image_url) => {
                state.image_url = Some(image_url);
                Outcome::Applied
            }
            Err(e) => {
                tracing::warn!("Failed to generate image: {}", e);
                state.error = Some(banner_text(&e));
                Outcome::Failed
            }
        }
    }

    pub async fn share_plan(&self, capabilities: ShareCapabilities) -> Result<SharePlan> {
        let state = self.state.lock().await;
        share::plan_share(&state.message, state.image_url.as_deref(), capabilities)
    }

    /// WhatsApp deep link sending the current draft to a saved contact.
    pub async fn whatsapp_link(&self, contact_id: &str) -> Result<String> {
        let phone = self
            .contacts
            .lock()
            .await
            .get(contact_id)
            .map(|c| c.phone.clone())
            .ok_or_else(|| Error::Validation(format!("Unknown contact {}", contact_id)))?;
        let message = self.state.lock().await.message.clone();
        share::whatsapp_link(&phone, &message)
    }

    pub async fn contacts(&self) -> Vec<Contact> {
        self.contacts.lock().await.contacts().to_vec()
    }

    pub async fn add_contact(&self, name: &str, phone: &str) -> Result<Contact> {
        let result = self.contacts.lock().await.add(name, phone);
        if let Err(e) = &result {
            self.state.lock().await.error = Some(banner_text(e));
        }
        result
    }

    pub async fn import_contacts(&self, batch: Vec<DeviceContact>) -> usize {
        let added = self.contacts.lock().await.import(batch);
        tracing::info!("Imported {} contacts", added);
        added
    }

    pub async fn remove_contact(&self, id: &str) -> bool {
        self.contacts.lock().await.remove(id)
    }
}
