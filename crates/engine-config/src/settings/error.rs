use collation::CollationError;
use model::records::field::ContactField;
use thiserror::Error;

/// Errors raised when loading or validating cursor settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid locale: {0}")]
    Locale(#[from] CollationError),

    /// At least one field must be sortable for a cursor to be created.
    #[error("No sortable fields configured")]
    NoSortableFields,

    #[error("Field '{0}' holds no text and cannot be sortable")]
    UnsortableField(ContactField),

    #[error("Mailbox capacity must be at least 1")]
    ZeroMailboxCapacity,

    #[error("Out-of-sync retries must be at least 1")]
    ZeroRetries,
}
