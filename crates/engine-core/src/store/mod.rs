//! In-memory indexed record store.
//!
//! Records live in a hash map keyed by `uid`. Every sort specification in
//! use by at least one cursor has an [`OrderIndex`] over composite
//! collation keys; cursors move by range scans over those indexes.
//! Mutations take the write lock, reads take the read lock, and no lock is
//! held between calls.

use crate::{
    error::CursorError,
    state::{RecordLog, models::StoreMeta},
    store::{
        index::{FieldKeys, OrderIndex, index_key},
        revision::Revision,
    },
};
use collation::{Collator, CollatorProvider, Locale};
use model::{
    pagination::sort::SortSpec,
    records::{field::ContactField, record::Record},
};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{debug, info};

mod index;
pub mod revision;
pub mod view;

pub use view::StoreView;

/// Static configuration of a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub locale: Locale,
    /// Fields that get collation keys and may appear in a sort spec.
    pub sortable_fields: Vec<ContactField>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            locale: Locale::posix(),
            sortable_fields: vec![
                ContactField::FullName,
                ContactField::GivenName,
                ContactField::FamilyName,
                ContactField::Nickname,
                ContactField::Email,
            ],
        }
    }
}

pub(crate) struct StoredRecord {
    pub(crate) record: Record,
    pub(crate) keys: FieldKeys,
}

pub(crate) struct StoreInner {
    pub(crate) records: HashMap<String, StoredRecord>,
    pub(crate) indexes: HashMap<SortSpec, OrderIndex>,
    pub(crate) sortable: Vec<ContactField>,
    pub(crate) collator: Arc<dyn Collator>,
    pub(crate) revision: Revision,
    /// Bumped on every locale change; cursors compare it to notice that
    /// their token was computed under another locale.
    pub(crate) locale_epoch: u64,
}

impl StoreInner {
    fn field_keys(&self, record: &Record) -> FieldKeys {
        self.sortable
            .iter()
            .map(|f| (*f, self.collator.sort_key(record.sort_value(*f))))
            .collect()
    }

    fn unindex(&mut self, uid: &str) -> Option<StoredRecord> {
        let stored = self.records.remove(uid)?;
        for (spec, index) in self.indexes.iter_mut() {
            index.entries.remove(&index_key(spec, &stored.keys, uid));
        }
        Some(stored)
    }

    fn index(&mut self, record: Record) {
        let keys = self.field_keys(&record);
        for (spec, index) in self.indexes.iter_mut() {
            index.entries.insert(index_key(spec, &keys, &record.uid));
        }
        self.records
            .insert(record.uid.clone(), StoredRecord { record, keys });
    }

    fn rebuild(&mut self) {
        let records: Vec<Record> = self.records.drain().map(|(_, s)| s.record).collect();
        for index in self.indexes.values_mut() {
            index.entries.clear();
        }
        for record in records {
            self.index(record);
        }
    }

    fn validate(&self, spec: &SortSpec) -> Result<(), CursorError> {
        if spec.is_empty() {
            return Err(CursorError::InvalidQuery(
                "sort specification has no fields".to_string(),
            ));
        }

        for field in spec.fields() {
            if !field.is_text() {
                return Err(CursorError::NotSupported { field });
            }
            if !self.sortable.contains(&field) {
                return Err(CursorError::InvalidQuery(format!(
                    "field '{field}' is not declared sortable"
                )));
            }
        }

        Ok(())
    }
}

/// Shared handle to an indexed record store. Cloning is cheap.
#[derive(Clone)]
pub struct IndexedStore {
    inner: Arc<RwLock<StoreInner>>,
    provider: Arc<dyn CollatorProvider>,
    log: Option<Arc<dyn RecordLog>>,
}

impl IndexedStore {
    pub fn new(
        config: StoreConfig,
        provider: Arc<dyn CollatorProvider>,
    ) -> Result<Self, CursorError> {
        let collator = provider.collator(&config.locale)?;
        info!(
            locale = %config.locale,
            sortable = config.sortable_fields.len(),
            "created indexed store"
        );

        Ok(Self {
            inner: Arc::new(RwLock::new(StoreInner {
                records: HashMap::new(),
                indexes: HashMap::new(),
                sortable: config.sortable_fields,
                collator,
                revision: Revision::starting_at(0),
                locale_epoch: 0,
            })),
            provider,
            log: None,
        })
    }

    /// Opens a store backed by `log`, replaying its records. A locale saved
    /// in the log wins over the configured one.
    pub async fn open(
        mut config: StoreConfig,
        provider: Arc<dyn CollatorProvider>,
        log: Arc<dyn RecordLog>,
    ) -> Result<Self, CursorError> {
        let meta = log.load_meta().await?;
        let counter = match &meta {
            Some(meta) => {
                config.locale = meta.locale.clone();
                meta.revision_counter
            }
            None => 0,
        };

        let records = log.load_records().await?;
        let mut store = Self::new(config, provider)?;
        {
            let mut inner = store.write()?;
            inner.revision = Revision::starting_at(counter);
            for record in records {
                inner.index(record);
            }
            info!(
                records = inner.records.len(),
                revision = %inner.revision.as_str(),
                "replayed record log"
            );
        }
        store.log = Some(log);
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreInner>, CursorError> {
        self.inner
            .read()
            .map_err(|_| CursorError::Store("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner>, CursorError> {
        self.inner
            .write()
            .map_err(|_| CursorError::Store("store lock poisoned".to_string()))
    }

    /// A consistent read-only view. Hold it only for the duration of one
    /// operation.
    pub fn view(&self) -> Result<StoreView<'_>, CursorError> {
        Ok(StoreView::new(self.read()?))
    }

    pub fn revision(&self) -> Result<String, CursorError> {
        Ok(self.read()?.revision.as_str().to_string())
    }

    pub fn locale(&self) -> Result<Locale, CursorError> {
        Ok(self.read()?.collator.locale().clone())
    }

    pub fn len(&self) -> Result<usize, CursorError> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, CursorError> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, uid: &str) -> Result<Option<Record>, CursorError> {
        Ok(self.read()?.records.get(uid).map(|s| s.record.clone()))
    }

    pub fn provider(&self) -> &Arc<dyn CollatorProvider> {
        &self.provider
    }

    /// Adds a record or replaces the record with the same `uid`. Returns the
    /// new store revision.
    pub async fn upsert(&self, mut record: Record) -> Result<String, CursorError> {
        let (revision, meta) = {
            let mut inner = self.write()?;
            inner.revision.bump();
            record.revision = inner.revision.as_str().to_string();
            inner.unindex(&record.uid);
            inner.index(record.clone());
            debug!(uid = %record.uid, revision = %record.revision, "upserted record");
            (record.revision.clone(), Self::meta(&inner))
        };

        if let Some(log) = &self.log {
            log.put_record(&record).await?;
            log.save_meta(&meta).await?;
        }

        Ok(revision)
    }

    /// Removes a record. Returns `None` when no record had that `uid`.
    pub async fn remove(&self, uid: &str) -> Result<Option<String>, CursorError> {
        let (revision, meta) = {
            let mut inner = self.write()?;
            if inner.unindex(uid).is_none() {
                return Ok(None);
            }
            inner.revision.bump();
            debug!(uid = %uid, revision = %inner.revision.as_str(), "removed record");
            (inner.revision.as_str().to_string(), Self::meta(&inner))
        };

        if let Some(log) = &self.log {
            log.delete_record(uid).await?;
            log.save_meta(&meta).await?;
        }

        Ok(Some(revision))
    }

    /// Switches the active locale: recomputes every collation key, rebuilds
    /// every index and bumps the revision. Records themselves are untouched.
    pub async fn set_locale(&self, locale: Locale) -> Result<String, CursorError> {
        let collator = self.provider.collator(&locale)?;

        let (revision, meta) = {
            let mut inner = self.write()?;
            if inner.collator.locale() == &locale {
                return Ok(inner.revision.as_str().to_string());
            }
            inner.collator = collator;
            inner.locale_epoch += 1;
            inner.rebuild();
            inner.revision.bump();
            info!(
                locale = %locale,
                revision = %inner.revision.as_str(),
                "store locale changed"
            );
            (inner.revision.as_str().to_string(), Self::meta(&inner))
        };

        if let Some(log) = &self.log {
            log.save_meta(&meta).await?;
        }

        Ok(revision)
    }

    /// Checks `spec` against the store configuration and makes sure an index
    /// exists for it. Every successful call must be paired with
    /// [`release_ordering`](Self::release_ordering).
    pub fn acquire_ordering(&self, spec: &SortSpec) -> Result<(), CursorError> {
        let mut inner = self.write()?;
        inner.validate(spec)?;

        if !inner.indexes.contains_key(spec) {
            let mut index = OrderIndex::new();
            for (uid, stored) in &inner.records {
                index.entries.insert(index_key(spec, &stored.keys, uid));
            }
            debug!(sort = %spec, entries = index.entries.len(), "built order index");
            inner.indexes.insert(spec.clone(), index);
        }

        if let Some(index) = inner.indexes.get_mut(spec) {
            index.users += 1;
        }
        Ok(())
    }

    /// Number of live cursors holding the index for `spec`; 0 once dropped.
    pub fn ordering_users(&self, spec: &SortSpec) -> Result<usize, CursorError> {
        Ok(self.read()?.indexes.get(spec).map_or(0, |index| index.users))
    }

    pub fn release_ordering(&self, spec: &SortSpec) -> Result<(), CursorError> {
        let mut inner = self.write()?;
        let unused = match inner.indexes.get_mut(spec) {
            Some(index) => {
                index.users = index.users.saturating_sub(1);
                index.users == 0
            }
            None => false,
        };
        if unused {
            inner.indexes.remove(spec);
            debug!(sort = %spec, "dropped order index");
        }
        Ok(())
    }

    fn meta(inner: &StoreInner) -> StoreMeta {
        StoreMeta {
            locale: inner.collator.locale().clone(),
            revision_counter: inner.revision.counter(),
        }
    }
}

impl std::fmt::Debug for IndexedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedStore")
            .field("persistent", &self.log.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::sled_store::SledRecordLog;
    use collation::BuiltinCollators;
    use model::pagination::sort::SortKey;
    use tempfile::tempdir;

    fn store() -> IndexedStore {
        IndexedStore::new(StoreConfig::default(), BuiltinCollators::shared()).unwrap()
    }

    fn by_family() -> SortSpec {
        SortSpec::ascending(&[ContactField::FamilyName])
    }

    #[tokio::test]
    async fn every_mutation_bumps_the_revision() {
        let store = store();
        let r0 = store.revision().unwrap();
        let r1 = store.upsert(Record::new("a")).await.unwrap();
        assert_ne!(r0, r1);
        let r2 = store.remove("a").await.unwrap().unwrap();
        assert_ne!(r1, r2);
        assert_eq!(store.remove("a").await.unwrap(), None);
        assert_eq!(store.revision().unwrap(), r2);
    }

    #[tokio::test]
    async fn upsert_stamps_record_revision() {
        let store = store();
        let rev = store.upsert(Record::new("a")).await.unwrap();
        assert_eq!(store.get("a").unwrap().unwrap().revision, rev);
    }

    #[test]
    fn rejects_empty_and_unsortable_specs() {
        let store = store();
        assert!(matches!(
            store.acquire_ordering(&SortSpec::default()),
            Err(CursorError::InvalidQuery(_))
        ));
        assert!(matches!(
            store.acquire_ordering(&SortSpec::ascending(&[ContactField::Note])),
            Err(CursorError::InvalidQuery(_))
        ));
        assert_eq!(
            store.acquire_ordering(&SortSpec::ascending(&[ContactField::Photo])),
            Err(CursorError::NotSupported {
                field: ContactField::Photo
            })
        );
    }

    #[tokio::test]
    async fn indexes_are_shared_and_dropped_with_last_user() {
        let store = store();
        store.upsert(Record::new("a")).await.unwrap();
        let spec = by_family().then(SortKey::descending(ContactField::GivenName));
        store.acquire_ordering(&spec).unwrap();
        store.acquire_ordering(&spec).unwrap();
        assert_eq!(store.read().unwrap().indexes[&spec].users, 2);

        store.release_ordering(&spec).unwrap();
        assert!(store.read().unwrap().indexes.contains_key(&spec));
        store.release_ordering(&spec).unwrap();
        assert!(!store.read().unwrap().indexes.contains_key(&spec));
    }

    #[tokio::test]
    async fn locale_change_rebuilds_keys_and_bumps_epoch() {
        let store = store();
        store
            .upsert(Record::new("a").with_field(ContactField::FamilyName, "bad"))
            .await
            .unwrap();
        let before = store.revision().unwrap();

        let after = store
            .set_locale(Locale::parse("en_US.UTF-8").unwrap())
            .await
            .unwrap();
        assert_ne!(before, after);
        assert_eq!(store.read().unwrap().locale_epoch, 1);
        assert_eq!(store.locale().unwrap().canonical(), "en_US");

        // Same locale again is a no-op.
        let same = store.set_locale(Locale::parse("en_US").unwrap()).await.unwrap();
        assert_eq!(same, after);
    }

    #[tokio::test]
    async fn reopens_from_record_log() {
        let dir = tempdir().unwrap();
        let log: Arc<dyn RecordLog> = Arc::new(SledRecordLog::open(dir.path()).unwrap());

        let store = IndexedStore::open(
            StoreConfig::default(),
            BuiltinCollators::shared(),
            log.clone(),
        )
        .await
        .unwrap();
        store
            .upsert(Record::new("a").with_field(ContactField::FamilyName, "Caron"))
            .await
            .unwrap();
        store
            .set_locale(Locale::parse("fr_CA").unwrap())
            .await
            .unwrap();
        let revision = store.revision().unwrap();
        drop(store);

        let reopened = IndexedStore::open(StoreConfig::default(), BuiltinCollators::shared(), log)
            .await
            .unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
        assert_eq!(reopened.locale().unwrap().canonical(), "fr_CA");
        assert!(reopened.revision().unwrap().ends_with("(2)"));
        assert!(revision.ends_with("(2)"));
    }
}
