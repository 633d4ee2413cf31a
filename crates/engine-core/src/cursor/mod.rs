//! Store-side cursor: an ordering, an optional filter and a position token.
//!
//! Every operation takes a fresh [`StoreView`], answers from it and drops
//! it before returning, so a cursor never holds the store lock between
//! calls.

use crate::{
    error::CursorError,
    metrics::Metrics,
    store::{IndexedStore, StoreView},
};
use collation::Locale;
use model::{
    filter::Filter,
    pagination::{
        cursor::{AlphabetSnapshot, PositionToken},
        sort::SortSpec,
        step::{StepFlags, StepOrigin, StepRequest, StepResult},
    },
};
use planner::query::{CountQuery, Direction, KeysetOffset, PositionPlan};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Result of a position calculation, all taken from one consistent read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calculation {
    pub total: u32,
    pub position: u32,
    pub revision: String,
    pub locale: Locale,
    pub alphabet: AlphabetSnapshot,
}

pub struct CursorState {
    name: String,
    store: IndexedStore,
    sort_spec: SortSpec,
    filter: Option<Filter>,
    token: PositionToken,
    locale_epoch: u64,
    metrics: Metrics,
}

impl CursorState {
    /// Fails with `InvalidQuery` or `NotSupported` when `sort_spec` cannot
    /// be indexed by `store`.
    pub fn new(
        name: impl Into<String>,
        store: IndexedStore,
        sort_spec: SortSpec,
        filter: Option<Filter>,
        metrics: Metrics,
    ) -> Result<Self, CursorError> {
        let locale_epoch = store.view()?.locale_epoch();
        store.acquire_ordering(&sort_spec)?;
        let name = name.into();
        debug!(cursor = %name, sort = %sort_spec, ?filter, "created cursor state");

        Ok(Self {
            name,
            store,
            sort_spec,
            filter,
            token: PositionToken::BeforeFirst,
            locale_epoch,
            metrics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.sort_spec
    }

    pub fn token(&self) -> &PositionToken {
        &self.token
    }

    /// Advances and/or reads from the cursor.
    ///
    /// When `revision_guard` is set and differs from the store revision the
    /// step fails with `OutOfSync` without touching the token. Cancellation
    /// is honoured up to the point the token is committed.
    pub fn step(
        &mut self,
        request: StepRequest,
        revision_guard: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<StepResult, CursorError> {
        let store = self.store.clone();
        let view = store.view()?;
        self.sync_locale(&view);

        if let Some(expected) = revision_guard
            && expected != view.revision()
        {
            debug!(
                cursor = %self.name,
                expected = %expected,
                revision = %view.revision(),
                "step against stale revision"
            );
            return Err(CursorError::OutOfSync {
                revision: view.revision().to_string(),
            });
        }
        if cancel.is_cancelled() {
            return Err(CursorError::Cancelled);
        }

        let origin = match request.origin {
            StepOrigin::Begin => PositionToken::BeforeFirst,
            StepOrigin::End => PositionToken::AfterLast,
            StepOrigin::Current => self.token.clone(),
        };
        self.metrics.increment_steps(1);

        if request.count == 0 {
            if request.flags.contains(StepFlags::MOVE) {
                self.token = origin;
            }
            return Ok(StepResult::default());
        }

        let direction = Direction::of(request.count);
        let limit = request.limit();
        let query = KeysetOffset::step_query(&origin, direction, limit)
            .ok_or_else(CursorError::end_of_list)?;

        let entries = view.scan(&self.sort_spec, &query, self.filter.as_ref(), cancel)?;
        if cancel.is_cancelled() {
            return Err(CursorError::Cancelled);
        }

        let found = entries.len();
        let moved = i32::try_from(found)
            .map_err(|_| CursorError::Store(format!("page of {found} records overflows i32")))?;

        let last = entries.last().map(|(key, _)| key.clone());
        if request.flags.contains(StepFlags::MOVE) {
            self.token = KeysetOffset::next_token(last, found, limit, direction);
        }

        let mut records = Vec::new();
        if request.flags.contains(StepFlags::FETCH) {
            records = entries.into_iter().map(|(_, record)| record).collect();
            if direction == Direction::Backward {
                records.reverse();
            }
            self.metrics.increment_records_fetched(records.len() as u64);
        }

        trace!(
            cursor = %self.name,
            ?request,
            found,
            token = ?self.token,
            "stepped cursor"
        );

        Ok(StepResult { records, moved })
    }

    /// Counts matching records overall and up to the token.
    pub fn calculate(&mut self) -> Result<Calculation, CursorError> {
        let store = self.store.clone();
        let view = store.view()?;
        self.sync_locale(&view);
        self.metrics.increment_recalculations(1);

        let filter = self.filter.as_ref();
        let total = view.count(&self.sort_spec, &CountQuery::all(), filter)?;
        let position = match KeysetOffset::position_plan(&self.token) {
            PositionPlan::Start => 0,
            PositionPlan::End => total + 1,
            PositionPlan::Count(query) => view.count(&self.sort_spec, &query, filter)?,
        };

        let alphabet = AlphabetSnapshot {
            labels: Arc::from(view.alphabet().labels()),
            current_index: self.alphabet_index(&view),
        };

        Ok(Calculation {
            total,
            position,
            revision: view.revision().to_string(),
            locale: view.locale().clone(),
            alphabet,
        })
    }

    /// Replaces the filter and rewinds to before the first record.
    pub fn set_filter(&mut self, filter: Option<Filter>) {
        debug!(cursor = %self.name, ?filter, "cursor filter replaced");
        self.filter = filter;
        self.token = PositionToken::BeforeFirst;
    }

    /// Moves the token just before the first record of alphabet bucket
    /// `index`. `locale_guard` is the locale the caller took the index from.
    /// Targeting the underflow label of an alphabet without buckets leaves
    /// the token where it is.
    pub fn set_target_alphabetic_index(
        &mut self,
        index: usize,
        locale_guard: Option<&Locale>,
    ) -> Result<(), CursorError> {
        let store = self.store.clone();
        let view = store.view()?;
        self.sync_locale(&view);

        if let Some(expected) = locale_guard
            && expected != view.locale()
        {
            return Err(CursorError::OutOfSync {
                revision: view.revision().to_string(),
            });
        }

        // A lone underflow label does not split the list; the token stays.
        if index == 0 && view.alphabet().is_degenerate() {
            debug!(cursor = %self.name, "alphabet has no buckets, target ignored");
            return Ok(());
        }

        let probe = view.label_probe(&self.sort_spec, index)?;
        self.token = PositionToken::Boundary {
            label: index,
            probe,
        };
        debug!(cursor = %self.name, index, "cursor targeted alphabetic index");
        Ok(())
    }

    /// Alphabet bucket the token currently sits in.
    pub fn current_alphabet_index(&mut self) -> Result<u32, CursorError> {
        let store = self.store.clone();
        let view = store.view()?;
        self.sync_locale(&view);
        Ok(self.alphabet_index(&view))
    }

    /// Releases the cursor's hold on its ordering index.
    pub fn free(self) {
        debug!(cursor = %self.name, "freeing cursor state");
    }

    fn alphabet_index(&self, view: &StoreView<'_>) -> u32 {
        let index = match &self.token {
            PositionToken::BeforeFirst => 0,
            PositionToken::AfterLast => view.alphabet().len().saturating_sub(1),
            PositionToken::Record(key) => view.bucket_of(key),
            PositionToken::Boundary { label, .. } => *label,
        };
        index as u32
    }

    /// A token built under another locale is meaningless after a locale
    /// change; such cursors restart from before the first record.
    fn sync_locale(&mut self, view: &StoreView<'_>) {
        if self.locale_epoch != view.locale_epoch() {
            debug!(
                cursor = %self.name,
                locale = %view.locale(),
                "locale changed, rewinding cursor"
            );
            self.locale_epoch = view.locale_epoch();
            self.token = PositionToken::BeforeFirst;
        }
    }
}

impl Drop for CursorState {
    fn drop(&mut self) {
        if let Err(err) = self.store.release_ordering(&self.sort_spec) {
            warn!(cursor = %self.name, error = %err, "failed to release ordering");
        }
    }
}

impl std::fmt::Debug for CursorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorState")
            .field("name", &self.name)
            .field("sort_spec", &self.sort_spec)
            .field("filter", &self.filter)
            .field("token", &self.token)
            .finish()
    }
}
