//! Store-side service: owns the indexed store and spawns one cursor actor
//! per created cursor.

use crate::{
    actor::{ActorRef, CursorActor, messages::CursorMsg, spawn_actor},
    mirror::CursorMirror,
};
use collation::{BuiltinCollators, CollatorProvider, Locale};
use engine_config::settings::validated::ValidatedSettings;
use engine_core::{
    cursor::CursorState,
    error::CursorError,
    event_bus::EventBus,
    metrics::Metrics,
    retry::RetryPolicy,
    state::RecordLog,
    store::IndexedStore,
};
use model::{
    events::store::StoreMutated,
    filter::Filter,
    pagination::{cursor::CursorSnapshot, sort::SortSpec},
    records::record::Record,
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

/// Everything a mirror needs to talk to one store-side cursor.
pub struct CursorHandle {
    pub(crate) name: String,
    pub(crate) actor: ActorRef<CursorMsg>,
    pub(crate) snapshots: mpsc::UnboundedReceiver<CursorSnapshot>,
    pub(crate) task: JoinHandle<()>,
    pub(crate) sort_spec: SortSpec,
    pub(crate) provider: Arc<dyn CollatorProvider>,
    pub(crate) retry: RetryPolicy,
    pub(crate) metrics: Metrics,
    /// Cancels the store-event forwarder when dropped, letting the actor
    /// loop end once no `ActorRef` is left.
    pub(crate) forwarder: DropGuard,
}

impl CursorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frees a cursor that never got a mirror.
    pub async fn free(self) -> Result<(), CursorError> {
        free_actor(&self.actor, self.task).await
    }
}

impl std::fmt::Debug for CursorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorHandle")
            .field("name", &self.name)
            .field("sort_spec", &self.sort_spec)
            .finish_non_exhaustive()
    }
}

pub(crate) async fn free_actor(
    actor: &ActorRef<CursorMsg>,
    task: JoinHandle<()>,
) -> Result<(), CursorError> {
    actor.ask(|reply| CursorMsg::Free { reply }).await?;
    // The loop itself ends once the last ActorRef is dropped.
    drop(task);
    Ok(())
}

/// Owner of an address book and its cursors.
pub struct BookService {
    store: IndexedStore,
    bus: EventBus,
    settings: ValidatedSettings,
    metrics: Metrics,
    runtime: Handle,
    next_cursor: AtomicU64,
}

impl BookService {
    /// Service over an in-memory store. Cursor actors run on `runtime`.
    pub fn new(settings: ValidatedSettings, runtime: Handle) -> Result<Self, CursorError> {
        let store = IndexedStore::new(settings.store_config(), BuiltinCollators::shared())?;
        Ok(Self::with_store(store, settings, runtime))
    }

    /// Service over a store replayed from `log`.
    pub async fn open(
        settings: ValidatedSettings,
        log: Arc<dyn RecordLog>,
        runtime: Handle,
    ) -> Result<Self, CursorError> {
        let store =
            IndexedStore::open(settings.store_config(), BuiltinCollators::shared(), log).await?;
        Ok(Self::with_store(store, settings, runtime))
    }

    pub fn with_store(store: IndexedStore, settings: ValidatedSettings, runtime: Handle) -> Self {
        Self {
            store,
            bus: EventBus::new(),
            settings,
            metrics: Metrics::new(),
            runtime,
            next_cursor: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &IndexedStore {
        &self.store
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Creates a store-side cursor. Fails with `InvalidQuery` or
    /// `NotSupported` when `sort_spec` cannot be ordered.
    pub async fn create_cursor(
        &self,
        sort_spec: SortSpec,
        filter: Option<Filter>,
    ) -> Result<CursorHandle, CursorError> {
        let id = self.next_cursor.fetch_add(1, Ordering::Relaxed);
        let name = format!("cursor-{id}");

        let state = CursorState::new(
            name.clone(),
            self.store.clone(),
            sort_spec.clone(),
            filter,
            self.metrics.clone(),
        )?;

        let (outbound, snapshots) = mpsc::unbounded_channel();
        let forwarder = CancellationToken::new();
        let actor = CursorActor::new(state, outbound, self.metrics.clone(), forwarder.clone());
        let (actor_ref, task) = spawn_actor(
            &self.runtime,
            name.clone(),
            self.settings.mailbox_capacity(),
            actor,
        );

        self.forward_store_events(actor_ref.clone(), forwarder.clone()).await;

        info!(cursor = %name, sort = %sort_spec, "created cursor");
        Ok(CursorHandle {
            name,
            actor: actor_ref,
            snapshots,
            task,
            sort_spec,
            provider: self.store.provider().clone(),
            retry: self.settings.retry_policy(),
            metrics: self.metrics.clone(),
            forwarder: forwarder.drop_guard(),
        })
    }

    /// Creates a cursor and connects a mirror to it.
    pub async fn create_mirror(
        &self,
        sort_spec: SortSpec,
        filter: Option<Filter>,
    ) -> Result<CursorMirror, CursorError> {
        let handle = self.create_cursor(sort_spec, filter).await?;
        CursorMirror::connect(handle, self.runtime.clone()).await
    }

    /// Blocking form of [`create_mirror`](Self::create_mirror). Must not
    /// be called from inside the runtime.
    pub fn create_mirror_blocking(
        &self,
        sort_spec: SortSpec,
        filter: Option<Filter>,
    ) -> Result<CursorMirror, CursorError> {
        let _guard = self.runtime.enter();
        futures::executor::block_on(self.create_mirror(sort_spec, filter))
    }

    /// Tells every cursor that records were added, removed or re-sorted.
    pub async fn on_store_mutated(&self) -> Result<(), CursorError> {
        let event = StoreMutated::new(self.store.revision()?, self.store.locale()?);
        let delivered = self.bus.publish(event).await;
        debug!(cursors = delivered, "published store mutation");
        Ok(())
    }

    /// Inserts or replaces a record and notifies cursors.
    pub async fn add_record(&self, record: Record) -> Result<String, CursorError> {
        let revision = self.store.upsert(record).await?;
        self.on_store_mutated().await?;
        Ok(revision)
    }

    /// Removes a record and notifies cursors. Removing an unknown `uid` is a
    /// no-op.
    pub async fn remove_record(&self, uid: &str) -> Result<Option<String>, CursorError> {
        let revision = self.store.remove(uid).await?;
        if revision.is_some() {
            self.on_store_mutated().await?;
        }
        Ok(revision)
    }

    /// Switches the store locale and notifies cursors.
    pub async fn set_locale(&self, locale: Locale) -> Result<String, CursorError> {
        let revision = self.store.set_locale(locale).await?;
        self.on_store_mutated().await?;
        Ok(revision)
    }

    async fn forward_store_events(&self, actor: ActorRef<CursorMsg>, stop: CancellationToken) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Arc<StoreMutated>>();
        let subscription = self.bus.subscribe(tx).await;
        let bus = self.bus.clone();

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(event) => {
                            if actor.send(CursorMsg::StoreMutated(event)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            bus.unsubscribe(subscription).await;
            debug!(cursor = %actor.name(), "store event forwarder stopped");
        });
    }
}

impl std::fmt::Debug for BookService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookService")
            .field("store", &self.store)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
