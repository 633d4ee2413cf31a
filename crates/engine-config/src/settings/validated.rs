use collation::Locale;
use engine_core::{retry::RetryPolicy, store::StoreConfig};
use model::records::field::ContactField;

/// Immutable, validated configuration of a cursor service.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    /// Active collation locale of the store
    pub locale: Locale,
    /// Fields that get collation keys and may be sorted on
    pub sortable_fields: Vec<ContactField>,
    /// Bounded mailbox size of every store-side cursor
    pub mailbox_capacity: usize,
    /// How many times a mirror reissues a step after an out-of-sync reply
    pub out_of_sync_retries: usize,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

impl ValidatedSettings {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            locale: self.locale.clone(),
            sortable_fields: self.sortable_fields.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy::new(
            self.out_of_sync_retries,
            defaults.base_delay,
            defaults.max_delay,
        )
    }

    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity
    }
}

impl Default for ValidatedSettings {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            locale: store.locale,
            sortable_fields: store.sortable_fields,
            mailbox_capacity: 64,
            out_of_sync_retries: 5,
            log_level: None,
        }
    }
}
