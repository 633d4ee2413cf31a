use crate::{
    error::CursorError,
    store::StoreInner,
};
use collation::{Alphabet, Collator, Locale};
use model::{
    filter::Filter,
    pagination::{
        key::{IndexKey, KeyPart},
        sort::SortSpec,
    },
    records::record::Record,
};
use planner::query::{CountQuery, CursorQuery, Direction};
use std::sync::{Arc, RwLockReadGuard};
use tokio_util::sync::CancellationToken;

/// How many index entries a scan walks between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 64;

/// One consistent read of the store. Every query answered through the same
/// view sees the same committed state.
pub struct StoreView<'a> {
    inner: RwLockReadGuard<'a, StoreInner>,
}

impl<'a> StoreView<'a> {
    pub(super) fn new(inner: RwLockReadGuard<'a, StoreInner>) -> Self {
        Self { inner }
    }

    pub fn revision(&self) -> &str {
        self.inner.revision.as_str()
    }

    pub fn locale(&self) -> &Locale {
        self.inner.collator.locale()
    }

    pub fn locale_epoch(&self) -> u64 {
        self.inner.locale_epoch
    }

    pub fn collator(&self) -> Arc<dyn Collator> {
        self.inner.collator.clone()
    }

    pub fn alphabet(&self) -> &Alphabet {
        self.inner.collator.alphabet()
    }

    /// Answers a step query: up to `query.limit` matching entries beyond the
    /// query's bound, in walk order.
    pub fn scan(
        &self,
        spec: &SortSpec,
        query: &CursorQuery,
        filter: Option<&Filter>,
        cancel: &CancellationToken,
    ) -> Result<Vec<(IndexKey, Record)>, CursorError> {
        let index = self
            .inner
            .indexes
            .get(spec)
            .ok_or_else(|| CursorError::Store(format!("no index for ordering '{spec}'")))?;

        let range = index.entries.range::<IndexKey, _>(query.range());
        let entries: Box<dyn Iterator<Item = &IndexKey> + '_> = match query.direction {
            Direction::Forward => Box::new(range),
            Direction::Backward => Box::new(range.rev()),
        };

        let mut out = Vec::with_capacity(query.limit.min(index.entries.len()));
        for (walked, key) in entries.enumerate() {
            if out.len() >= query.limit {
                break;
            }
            if walked % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(CursorError::Cancelled);
            }

            let record = self.record(key.uid())?;
            if filter.is_none_or(|f| f.matches(record)) {
                out.push((key.clone(), record.clone()));
            }
        }

        Ok(out)
    }

    /// Number of matching entries the query selects.
    pub fn count(
        &self,
        spec: &SortSpec,
        query: &CountQuery,
        filter: Option<&Filter>,
    ) -> Result<u32, CursorError> {
        let index = self
            .inner
            .indexes
            .get(spec)
            .ok_or_else(|| CursorError::Store(format!("no index for ordering '{spec}'")))?;

        let range = index.entries.range::<IndexKey, _>(query.range());
        let count = match filter {
            None => range.count(),
            Some(filter) => {
                let mut n = 0;
                for key in range {
                    if filter.matches(self.record(key.uid())?) {
                        n += 1;
                    }
                }
                n
            }
        };

        u32::try_from(count)
            .map_err(|_| CursorError::Store(format!("record count {count} overflows u32")))
    }

    /// Probe that sits immediately before the first entry whose leading sort
    /// column collates at or after alphabet label `label`.
    pub fn label_probe(&self, spec: &SortSpec, label: usize) -> Result<IndexKey, CursorError> {
        let alphabet = self.alphabet();
        let start = alphabet.start_key(label).ok_or_else(|| {
            CursorError::InvalidQuery(format!(
                "alphabetic index {label} is outside the alphabet of {} labels",
                alphabet.len()
            ))
        })?;
        let primary = spec
            .primary()
            .ok_or_else(|| CursorError::InvalidQuery("sort specification has no fields".into()))?;

        Ok(IndexKey::probe(KeyPart::new(start.clone(), primary.direction)))
    }

    /// Bucket of the record behind `key`, taken from its leading sort column.
    pub fn bucket_of(&self, key: &IndexKey) -> usize {
        key.first()
            .map(|part| self.alphabet().bucket_of(part.collation_key()))
            .unwrap_or(0)
    }

    fn record(&self, uid: &str) -> Result<&Record, CursorError> {
        self.inner
            .records
            .get(uid)
            .map(|stored| &stored.record)
            .ok_or_else(|| CursorError::Store(format!("index entry without record '{uid}'")))
    }
}
