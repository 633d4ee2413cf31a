//! Cursor service settings.
//!
//! Settings are read from a JSON document. Every key is optional:
//!
//! ```json
//! { "locale": "en_US.UTF-8", "sortable_fields": ["family_name", "given_name"] }
//! ```

use crate::settings::{error::SettingsError, validated::ValidatedSettings};
use collation::Locale;
use model::records::field::ContactField;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub mod error;
pub mod validated;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorSettings {
    pub locale: String,
    pub sortable_fields: Vec<ContactField>,
    pub mailbox_capacity: usize,
    pub out_of_sync_retries: usize,
    pub log_level: Option<String>,
}

impl Default for CursorSettings {
    fn default() -> Self {
        let validated = ValidatedSettings::default();
        Self {
            locale: validated.locale.to_string(),
            sortable_fields: validated.sortable_fields,
            mailbox_capacity: validated.mailbox_capacity,
            out_of_sync_retries: validated.out_of_sync_retries,
            log_level: validated.log_level,
        }
    }
}

impl CursorSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        info!(path = %path.display(), locale = %settings.locale, "Loaded cursor settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<ValidatedSettings, SettingsError> {
        let locale = Locale::parse(&self.locale)?;

        if self.sortable_fields.is_empty() {
            return Err(SettingsError::NoSortableFields);
        }
        if let Some(field) = self.sortable_fields.iter().find(|f| !f.is_text()) {
            return Err(SettingsError::UnsortableField(*field));
        }
        if self.mailbox_capacity == 0 {
            return Err(SettingsError::ZeroMailboxCapacity);
        }
        if self.out_of_sync_retries == 0 {
            return Err(SettingsError::ZeroRetries);
        }

        let mut sortable_fields = self.sortable_fields.clone();
        sortable_fields.dedup();

        Ok(ValidatedSettings {
            locale,
            sortable_fields,
            mailbox_capacity: self.mailbox_capacity,
            out_of_sync_retries: self.out_of_sync_retries,
            log_level: self.log_level.clone(),
        })
    }
}
