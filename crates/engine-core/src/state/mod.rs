use crate::{error::RecordLogError, state::models::StoreMeta};
use async_trait::async_trait;
use model::records::record::Record;

pub mod models;
pub mod sled_store;

/// Durable backing for an [`IndexedStore`](crate::store::IndexedStore).
///
/// The store keeps every record and index in memory; a log only has to
/// replay records and the store metadata on open.
#[async_trait]
pub trait RecordLog: Send + Sync {
    async fn put_record(&self, record: &Record) -> Result<(), RecordLogError>;
    async fn delete_record(&self, uid: &str) -> Result<(), RecordLogError>;
    async fn load_records(&self) -> Result<Vec<Record>, RecordLogError>;
    async fn save_meta(&self, meta: &StoreMeta) -> Result<(), RecordLogError>;
    async fn load_meta(&self) -> Result<Option<StoreMeta>, RecordLogError>;
}
