use super::Event;
use collation::Locale;

/// Emitted by the owning store after records were added, removed or
/// re-sorted. Every store-side cursor recomputes its counts on receipt.
#[derive(Debug, Clone)]
pub struct StoreMutated {
    pub revision: String,
    pub locale: Locale,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl StoreMutated {
    pub fn new(revision: impl Into<String>, locale: Locale) -> Self {
        StoreMutated {
            revision: revision.into(),
            locale,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl Event for StoreMutated {
    fn event_type(&self) -> &'static str {
        "store.mutated"
    }
}
