use thiserror::Error;

/// Errors raised while resolving a locale into a collator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollationError {
    #[error("Empty locale identifier")]
    EmptyLocale,

    #[error("Invalid language code in locale '{locale}': '{language}'")]
    InvalidLanguage { locale: String, language: String },

    #[error("Collator registry lock poisoned")]
    RegistryPoisoned,
}

pub type Result<T> = std::result::Result<T, CollationError>;
