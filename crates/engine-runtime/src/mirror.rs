//! Client-side cursor mirror.
//!
//! A [`CursorMirror`] caches `total`, `position` and the alphabet of one
//! store-side cursor and keeps them current from snapshots the cursor
//! pushes. Callers read the cache without a round trip and learn about
//! changes through [`CursorEvent`]s.
//!
//! # Consistency protocol
//!
//! Every step carries the store revision the mirror last saw. If the store
//! has moved on, the step fails with `OutOfSync` and nothing changes. The
//! store-side cursor always pushes a snapshot after a mutation; applying a
//! pushed snapshot emits [`CursorEvent::Refresh`]. A caller that receives
//! `OutOfSync` waits for one refresh and reissues the same step, which
//! [`CursorMirror::step_with_retry`] does within a bounded number of
//! attempts.
//!
//! Dropping a mirror without [`CursorMirror::free`] still stops its
//! store-side cursor: the forwarder is cancelled, the actor loop ends with
//! its last `ActorRef`, and the cursor releases its order index.

use crate::{
    actor::{
        ActorRef,
        messages::{CursorMsg, StepReply},
    },
    service::{CursorHandle, free_actor},
};
use collation::{CollatorProvider, Locale};
use engine_core::{
    error::CursorError,
    metrics::Metrics,
    retry::{RetryDisposition, RetryPolicy},
};
use model::{
    events::cursor::CursorEvent,
    filter::Filter,
    pagination::{
        cursor::{AlphabetSnapshot, CursorSnapshot},
        sort::SortSpec,
        step::{StepFlags, StepOrigin, StepRequest, StepResult},
    },
    records::record::Record,
};
use std::{
    cell::Cell,
    future::Future,
    marker::PhantomData,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

/// Upper bound on how long a retry waits for a refresh before reissuing.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct MirrorCache {
    seq: u64,
    total: u32,
    position: u32,
    alphabet: AlphabetSnapshot,
    revision: String,
    locale: Locale,
    out_of_sync: bool,
}

impl MirrorCache {
    fn from_snapshot(snapshot: CursorSnapshot) -> Self {
        Self {
            seq: snapshot.seq,
            total: snapshot.total,
            position: snapshot.position,
            alphabet: snapshot.alphabet,
            revision: snapshot.revision,
            locale: snapshot.locale,
            out_of_sync: false,
        }
    }
}

/// State shared between the mirror and the task applying pushed snapshots.
struct Shared {
    name: String,
    cache: Mutex<MirrorCache>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<CursorEvent>>>,
    refreshes: watch::Sender<u64>,
    /// Refresh generation observed when the latest step was sent.
    sent_generation: AtomicU64,
    metrics: Metrics,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    /// Applies a snapshot and emits the resulting notifications. `refresh`
    /// marks snapshots the store pushed on its own.
    fn apply(&self, snapshot: CursorSnapshot, refresh: bool) {
        let mut cache = lock(&self.cache);
        let mut events = Vec::new();

        if snapshot.seq > cache.seq {
            if snapshot.total != cache.total {
                events.push(CursorEvent::TotalChanged(snapshot.total));
            }
            if snapshot.position != cache.position {
                events.push(CursorEvent::PositionChanged(snapshot.position));
            }
            if snapshot.alphabet.labels != cache.alphabet.labels || snapshot.locale != cache.locale
            {
                events.push(CursorEvent::AlphabetChanged);
            }

            let out_of_sync = cache.out_of_sync && !refresh;
            *cache = MirrorCache::from_snapshot(snapshot);
            cache.out_of_sync = out_of_sync;
        } else {
            debug!(
                cursor = %self.name,
                seq = snapshot.seq,
                applied = cache.seq,
                "ignoring stale snapshot"
            );
        }

        if refresh {
            cache.out_of_sync = false;
            events.push(CursorEvent::Refresh);
        }

        // Emitted under the cache lock so notifications keep the order of
        // the changes that caused them.
        self.emit(&events);
        if refresh {
            self.metrics.increment_refreshes(1);
            self.refreshes.send_modify(|generation| *generation += 1);
        }
    }

    fn emit(&self, events: &[CursorEvent]) {
        if events.is_empty() {
            return;
        }
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|tx| events.iter().all(|event| tx.send(*event).is_ok()));
    }

    fn mark_out_of_sync(&self) {
        lock(&self.cache).out_of_sync = true;
    }
}

/// The pieces of a mirror a step needs; cheap to clone into retry attempts.
#[derive(Clone)]
struct Link {
    actor: ActorRef<CursorMsg>,
    shared: Arc<Shared>,
}

impl Link {
    async fn step(
        &self,
        request: StepRequest,
        cancel: CancellationToken,
    ) -> Result<StepResult, CursorError> {
        let revision = lock(&self.shared.cache).revision.clone();
        self.shared
            .sent_generation
            .store(*self.shared.refreshes.borrow(), Ordering::SeqCst);

        let outcome = self
            .actor
            .ask(|reply| CursorMsg::Step {
                request,
                revision: Some(revision),
                cancel,
                reply,
            })
            .await?;

        match outcome {
            Ok(StepReply { result, snapshot }) => {
                self.shared.apply(snapshot, false);
                Ok(result)
            }
            Err(err) => {
                if err.is_out_of_sync() {
                    self.shared.mark_out_of_sync();
                }
                Err(err)
            }
        }
    }
}

/// Client view of one store-side cursor.
///
/// A mirror is bound to the runtime it was connected on. It is `Send` but
/// not `Sync`: calls on one mirror are serialized through `&mut self`, and
/// a thread that wants its own cursor creates its own mirror.
pub struct CursorMirror {
    link: Link,
    runtime: Handle,
    task: JoinHandle<()>,
    pump: JoinHandle<()>,
    sort_spec: SortSpec,
    provider: Arc<dyn CollatorProvider>,
    retry: RetryPolicy,
    _forwarder: DropGuard,
    _not_sync: PhantomData<Cell<()>>,
}

impl CursorMirror {
    /// Connects a mirror to `cursor`, loading its initial counts. Pushed
    /// snapshots are applied by a task on `runtime`.
    pub async fn connect(cursor: CursorHandle, runtime: Handle) -> Result<Self, CursorError> {
        let CursorHandle {
            name,
            actor,
            mut snapshots,
            task,
            sort_spec,
            provider,
            retry,
            metrics,
            forwarder,
        } = cursor;

        let initial = actor.ask(|reply| CursorMsg::Calculate { reply }).await??;
        let (refreshes, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            name,
            cache: Mutex::new(MirrorCache::from_snapshot(initial)),
            subscribers: Mutex::new(Vec::new()),
            refreshes,
            sent_generation: AtomicU64::new(0),
            metrics,
        });

        let pump_shared = shared.clone();
        let pump = runtime.spawn(async move {
            while let Some(snapshot) = snapshots.recv().await {
                pump_shared.apply(snapshot, true);
            }
            debug!(cursor = %pump_shared.name, "snapshot pump stopped");
        });

        debug!(cursor = %shared.name, "mirror connected");
        Ok(Self {
            link: Link { actor, shared },
            runtime,
            task,
            pump,
            sort_spec,
            provider,
            retry,
            _forwarder: forwarder,
            _not_sync: PhantomData,
        })
    }

    /// Blocking form of [`connect`](Self::connect). Must not be called from
    /// inside the runtime.
    pub fn connect_blocking(cursor: CursorHandle, runtime: Handle) -> Result<Self, CursorError> {
        let _guard = runtime.enter();
        futures::executor::block_on(Self::connect(cursor, runtime.clone()))
    }

    pub fn name(&self) -> &str {
        &self.link.shared.name
    }

    /// Receives every notification emitted after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<CursorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.link.shared.subscribers).push(tx);
        rx
    }

    pub fn total(&self) -> u32 {
        lock(&self.link.shared.cache).total
    }

    pub fn position(&self) -> u32 {
        lock(&self.link.shared.cache).position
    }

    /// Labels, label count and current bucket of the active alphabet.
    pub fn alphabet(&self) -> AlphabetSnapshot {
        lock(&self.link.shared.cache).alphabet.clone()
    }

    pub fn locale(&self) -> Locale {
        lock(&self.link.shared.cache).locale.clone()
    }

    pub fn revision(&self) -> String {
        lock(&self.link.shared.cache).revision.clone()
    }

    /// True between an `OutOfSync` reply and the next refresh.
    pub fn is_out_of_sync(&self) -> bool {
        lock(&self.link.shared.cache).out_of_sync
    }

    pub async fn step(
        &mut self,
        flags: StepFlags,
        origin: StepOrigin,
        count: i32,
        cancel: Option<CancellationToken>,
    ) -> Result<StepResult, CursorError> {
        self.link
            .step(
                StepRequest::new(flags, origin, count),
                cancel.unwrap_or_default(),
            )
            .await
    }

    pub fn step_blocking(
        &mut self,
        flags: StepFlags,
        origin: StepOrigin,
        count: i32,
        cancel: Option<CancellationToken>,
    ) -> Result<StepResult, CursorError> {
        let link = self.link.clone();
        self.block_on(async move {
            link.step(
                StepRequest::new(flags, origin, count),
                cancel.unwrap_or_default(),
            )
            .await
        })
    }

    /// Steps, and on `OutOfSync` waits for one refresh before reissuing the
    /// identical request. Gives up after the configured number of attempts
    /// and returns the last error.
    pub async fn step_with_retry(
        &mut self,
        flags: StepFlags,
        origin: StepOrigin,
        count: i32,
        cancel: Option<CancellationToken>,
    ) -> Result<StepResult, CursorError> {
        let request = StepRequest::new(flags, origin, count);
        let cancel = cancel.unwrap_or_default();
        let link = self.link.clone();
        let shared = self.link.shared.clone();

        self.retry
            .run_with(
                || {
                    let link = link.clone();
                    let cancel = cancel.clone();
                    async move { link.step(request, cancel).await }
                },
                |err| {
                    if err.is_out_of_sync() {
                        RetryDisposition::Retry
                    } else {
                        RetryDisposition::Stop
                    }
                },
                |attempt, _| wait_for_refresh(shared.clone(), attempt),
            )
            .await
            .map_err(|err| err.into_inner())
    }

    pub fn step_with_retry_blocking(
        &mut self,
        flags: StepFlags,
        origin: StepOrigin,
        count: i32,
        cancel: Option<CancellationToken>,
    ) -> Result<StepResult, CursorError> {
        let runtime = self.runtime.clone();
        let _guard = runtime.enter();
        futures::executor::block_on(self.step_with_retry(flags, origin, count, cancel))
    }

    /// Asks the store for fresh counts and returns `(total, position)`.
    pub async fn calculate(&mut self) -> Result<(u32, u32), CursorError> {
        let snapshot = self
            .link
            .actor
            .ask(|reply| CursorMsg::Calculate { reply })
            .await??;
        let counts = (snapshot.total, snapshot.position);
        self.link.shared.apply(snapshot, false);
        Ok(counts)
    }

    pub fn calculate_blocking(&mut self) -> Result<(u32, u32), CursorError> {
        let runtime = self.runtime.clone();
        let _guard = runtime.enter();
        futures::executor::block_on(self.calculate())
    }

    /// Replaces the filter. New counts arrive as notifications.
    pub async fn set_filter(&mut self, filter: Option<Filter>) -> Result<(), CursorError> {
        self.link
            .actor
            .ask(|reply| CursorMsg::SetFilter { filter, reply })
            .await?
    }

    pub fn set_filter_blocking(&mut self, filter: Option<Filter>) -> Result<(), CursorError> {
        let runtime = self.runtime.clone();
        let _guard = runtime.enter();
        futures::executor::block_on(self.set_filter(filter))
    }

    /// Jumps before the first record of alphabet bucket `index`. New counts
    /// arrive as notifications.
    pub async fn set_target_alphabetic_index(&mut self, index: u32) -> Result<(), CursorError> {
        let locale = self.locale();
        self.link
            .actor
            .ask(|reply| CursorMsg::SetAlphabeticIndex {
                index: index as usize,
                locale: Some(locale),
                reply,
            })
            .await?
    }

    pub fn set_target_alphabetic_index_blocking(&mut self, index: u32) -> Result<(), CursorError> {
        let runtime = self.runtime.clone();
        let _guard = runtime.enter();
        futures::executor::block_on(self.set_target_alphabetic_index(index))
    }

    /// Bucket a record falls into under the mirror's locale, judged by the
    /// cursor's leading sort field.
    pub fn record_alphabetic_index(&self, record: &Record) -> Result<u32, CursorError> {
        let field = self
            .sort_spec
            .primary()
            .map(|key| key.field)
            .ok_or_else(|| CursorError::InvalidQuery("sort specification has no fields".into()))?;
        let collator = self.provider.collator(&self.locale())?;
        Ok(collator.alphabetic_index(record.sort_value(field)) as u32)
    }

    /// Releases the store-side cursor. Waits for the store to acknowledge.
    pub async fn free(self) -> Result<(), CursorError> {
        let Self {
            link, task, pump, ..
        } = self;
        debug!(cursor = %link.shared.name, "freeing mirror");
        let result = free_actor(&link.actor, task).await;
        drop(pump);
        result
    }

    pub fn free_blocking(self) -> Result<(), CursorError> {
        let runtime = self.runtime.clone();
        let _guard = runtime.enter();
        futures::executor::block_on(self.free())
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        let _guard = self.runtime.enter();
        futures::executor::block_on(future)
    }
}

async fn wait_for_refresh(shared: Arc<Shared>, attempt: usize) {
    let seen = shared.sent_generation.load(Ordering::SeqCst);
    let mut refreshes = shared.refreshes.subscribe();
    let waited = tokio::time::timeout(REFRESH_TIMEOUT, refreshes.wait_for(|g| *g > seen)).await;

    match waited {
        Ok(Ok(_)) => debug!(cursor = %shared.name, attempt, "refreshed, reissuing step"),
        Ok(Err(_)) => warn!(cursor = %shared.name, "refresh channel closed"),
        Err(_) => warn!(cursor = %shared.name, attempt, "no refresh before timeout, reissuing step"),
    }
}

impl std::fmt::Debug for CursorMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = lock(&self.link.shared.cache);
        f.debug_struct("CursorMirror")
            .field("name", &self.link.shared.name)
            .field("total", &cache.total)
            .field("position", &cache.position)
            .field("revision", &cache.revision)
            .field("out_of_sync", &cache.out_of_sync)
            .finish()
    }
}
