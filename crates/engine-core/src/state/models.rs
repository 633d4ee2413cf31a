use collation::Locale;
use serde::{Deserialize, Serialize};

/// Store level state persisted next to the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub locale: Locale,
    pub revision_counter: u64,
}
