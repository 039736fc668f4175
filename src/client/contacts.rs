//! In-memory contact list, unique by phone number.

use crate::models::Contact;
use crate::{Error, Result};

/// A contact as handed over by the device's contact picker, which may
/// carry several (or no) names and numbers.
#[derive(Debug, Clone, Default)]
pub struct DeviceContact {
    pub names: Vec<String>,
    pub phones: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ContactBook {
    contacts: Vec<Contact>,
}

/// Reduces a phone number to its digits, so `+55 (11) 9...` and
/// `5511 9...` compare equal.
pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn contains_phone(&self, phone: &str) -> bool {
        let digits = phone_digits(phone);
        !digits.is_empty() && self.contacts.iter().any(|c| phone_digits(&c.phone) == digits)
    }

    /// Manual entry: rejects a blank name, a number without digits, or a
    /// number already in the book.
    pub fn add(&mut self, name: &str, phone: &str) -> Result<Contact> {
        let name = name.trim();
        let phone = phone.trim();

        if name.is_empty() {
            return Err(Error::Validation("Contact name is required".to_string()));
        }
        if phone_digits(phone).is_empty() {
            return Err(Error::Validation("Contact phone is required".to_string()));
        }
        if self.contains_phone(phone) {
            return Err(Error::Validation(format!(
                "A contact with phone {} already exists",
                phone
            )));
        }

        Ok(self.insert(name, phone))
    }

    /// Best-effort import. Entries without a name or phone are skipped, as
    /// are numbers already present (including earlier in the same batch).
    /// Returns how many contacts were added.
    pub fn import(&mut self, batch: impl IntoIterator<Item = DeviceContact>) -> usize {
        let mut added = 0;

        for entry in batch {
            let name = entry.names.iter().map(|n| n.trim()).find(|n| !n.is_empty());
            let phone = entry
                .phones
                .iter()
                .map(|p| p.trim())
                .find(|p| !phone_digits(p).is_empty());

            let (Some(name), Some(phone)) = (name, phone) else {
                continue;
            };
            if self.contains_phone(phone) {
                tracing::debug!("Skipping duplicate contact {}", name);
                continue;
            }

            self.insert(name, phone);
            added += 1;
        }

        added
    }

    /// Removes a contact; `false` when the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.contacts.len();
        self.contacts.retain(|c| c.id != id);
        self.contacts.len() != before
    }

    fn insert(&mut self, name: &str, phone: &str) -> Contact {
        let contact = Contact {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
        };
        self.contacts.push(contact.clone());
        contact
    }
}
