use collation::CollationError;
use engine_config::settings::error::SettingsError;
use engine_core::error::CursorError;
use model::filter::FilterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the contacts file: {0}")]
    ContactsRead(#[from] std::io::Error),

    #[error("Failed to parse the contacts file: {0}")]
    ContactsParse(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid locale: {0}")]
    Locale(#[from] CollationError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),

    #[error("No alphabet label '{letter}' in locale {locale}")]
    UnknownLetter { letter: String, locale: String },

    #[error("Shutdown requested")]
    ShutdownRequested,
}
