use crate::{BookService, CursorMirror};
use engine_config::settings::validated::ValidatedSettings;
use engine_core::error::CursorError;
use model::{
    events::cursor::CursorEvent,
    filter::Filter,
    pagination::{
        sort::SortSpec,
        step::{StepFlags, StepOrigin},
    },
    records::{field::ContactField, record::Record},
};
use std::time::Duration;
use tokio::{runtime::Handle, sync::mpsc, time::timeout};

const MOVE_FETCH: StepFlags = StepFlags::MOVE.union(StepFlags::FETCH);

async fn service(names: &[&str]) -> BookService {
    let service = BookService::new(ValidatedSettings::default(), Handle::current()).unwrap();
    for (i, name) in names.iter().enumerate() {
        service
            .add_record(Record::new(format!("r{}", i + 1)).with_field(ContactField::FamilyName, *name))
            .await
            .unwrap();
    }
    service
}

async fn mirror(service: &BookService) -> CursorMirror {
    service
        .create_mirror(SortSpec::ascending(&[ContactField::FamilyName]), None)
        .await
        .unwrap()
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<CursorEvent>) -> CursorEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for cursor event")
        .expect("event channel closed")
}

async fn until_refresh(rx: &mut mpsc::UnboundedReceiver<CursorEvent>) -> Vec<CursorEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(rx).await;
        seen.push(event);
        if event == CursorEvent::Refresh {
            return seen;
        }
    }
}

#[tokio::test]
async fn mirror_starts_with_store_counts() {
    let service = service(&["b", "a", "c"]).await;
    let mirror = mirror(&service).await;
    assert_eq!(mirror.total(), 3);
    assert_eq!(mirror.position(), 0);
    assert_eq!(mirror.alphabet().n_labels(), 27);
    assert!(!mirror.is_out_of_sync());
}

#[tokio::test]
async fn step_updates_cached_position() {
    let service = service(&["b", "a", "c"]).await;
    let mut mirror = mirror(&service).await;
    let mut events = mirror.subscribe();

    let page = mirror
        .step(MOVE_FETCH, StepOrigin::Begin, 2, None)
        .await
        .unwrap();
    assert_eq!(page.uids(), vec!["r2", "r1"]);
    assert_eq!(mirror.position(), 2);
    assert_eq!(next_event(&mut events).await, CursorEvent::PositionChanged(2));
}

#[tokio::test]
async fn mutations_push_counts_then_refresh() {
    let service = service(&["b", "c"]).await;
    let mut mirror = mirror(&service).await;
    mirror.step(StepFlags::MOVE, StepOrigin::Begin, 1, None).await.unwrap();
    let mut events = mirror.subscribe();

    service
        .add_record(Record::new("r3").with_field(ContactField::FamilyName, "a"))
        .await
        .unwrap();

    assert_eq!(
        until_refresh(&mut events).await,
        vec![
            CursorEvent::TotalChanged(3),
            CursorEvent::PositionChanged(2),
            CursorEvent::Refresh
        ]
    );
    assert_eq!((mirror.total(), mirror.position()), (3, 2));
}

#[tokio::test]
async fn stale_step_is_out_of_sync_until_refresh() {
    let service = service(&["a", "b"]).await;
    let mut mirror = mirror(&service).await;
    let mut events = mirror.subscribe();

    // Mutate without notifying cursors: the mirror's revision is now stale.
    service.store().upsert(Record::new("r3")).await.unwrap();
    let err = mirror
        .step(MOVE_FETCH, StepOrigin::Begin, 1, None)
        .await
        .unwrap_err();
    assert!(err.is_out_of_sync());
    assert!(mirror.is_out_of_sync());
    assert_eq!(mirror.position(), 0);

    service.on_store_mutated().await.unwrap();
    until_refresh(&mut events).await;
    assert!(!mirror.is_out_of_sync());

    let page = mirror.step(MOVE_FETCH, StepOrigin::Begin, 1, None).await.unwrap();
    assert_eq!(page.uids(), vec!["r3"]);
    assert_eq!(service.metrics().snapshot().out_of_sync, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn step_with_retry_waits_for_refresh() {
    let service = std::sync::Arc::new(service(&["a", "b"]).await);
    let mut mirror = mirror(&service).await;

    service.store().upsert(Record::new("r0")).await.unwrap();
    let notifier = service.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        notifier.on_store_mutated().await.unwrap();
    });

    let page = mirror
        .step_with_retry(MOVE_FETCH, StepOrigin::Begin, 3, None)
        .await
        .unwrap();
    assert_eq!(page.records.len(), 3);
    assert!(service.metrics().snapshot().refreshes >= 1);
}

#[tokio::test]
async fn retry_does_not_mask_end_of_list() {
    let service = service(&["a"]).await;
    let mut mirror = mirror(&service).await;
    assert_eq!(
        mirror
            .step_with_retry(MOVE_FETCH, StepOrigin::Begin, -1, None)
            .await,
        Err(CursorError::end_of_list())
    );
}

#[tokio::test]
async fn filter_and_target_notify_asynchronously() {
    let service = service(&["apple", "berry", "cherry"]).await;
    let mut mirror = mirror(&service).await;
    let mut events = mirror.subscribe();

    mirror
        .set_filter(Some(Filter::parse(r#"(contains "family_name" "rr")"#).unwrap()))
        .await
        .unwrap();
    assert_eq!(
        until_refresh(&mut events).await,
        vec![CursorEvent::TotalChanged(2), CursorEvent::Refresh]
    );

    mirror.set_target_alphabetic_index(3).await.unwrap();
    assert_eq!(
        until_refresh(&mut events).await,
        vec![CursorEvent::PositionChanged(1), CursorEvent::Refresh]
    );
    assert_eq!(mirror.alphabet().current_index, 3);
}

#[tokio::test]
async fn invalid_sort_specs_are_rejected() {
    let service = service(&[]).await;
    assert!(matches!(
        service.create_cursor(SortSpec::default(), None).await,
        Err(CursorError::InvalidQuery(_))
    ));
    assert_eq!(
        service
            .create_cursor(SortSpec::ascending(&[ContactField::Birthday]), None)
            .await
            .unwrap_err(),
        CursorError::NotSupported {
            field: ContactField::Birthday
        }
    );
}

#[tokio::test]
async fn record_alphabetic_index_uses_primary_field() {
    let service = service(&["a"]).await;
    let mirror = mirror(&service).await;
    let record = Record::new("x").with_field(ContactField::FamilyName, "Müller");
    assert_eq!(mirror.record_alphabetic_index(&record).unwrap(), 13);
    assert_eq!(mirror.record_alphabetic_index(&Record::new("y")).unwrap(), 0);
}

#[tokio::test]
async fn freed_cursor_releases_its_index() {
    let service = service(&["a"]).await;
    let spec = SortSpec::ascending(&[ContactField::FamilyName]);
    let mirror = mirror(&service).await;
    mirror.free().await.unwrap();
    assert_eq!(service.store().ordering_users(&spec).unwrap(), 0);

    // Mutations after free reach no cursor and do not fail.
    service.add_record(Record::new("r2")).await.unwrap();
}

async fn until_released(service: &BookService, spec: &SortSpec) {
    timeout(Duration::from_secs(5), async {
        while service.store().ordering_users(spec).unwrap() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("order index still held");
}

#[tokio::test]
async fn dropped_mirror_stops_its_cursor() {
    let service = service(&["a", "b"]).await;
    let spec = SortSpec::ascending(&[ContactField::FamilyName]);
    let mirror = mirror(&service).await;
    assert_eq!(service.store().ordering_users(&spec).unwrap(), 1);

    drop(mirror);
    until_released(&service, &spec).await;
    service.add_record(Record::new("r3")).await.unwrap();
}

#[tokio::test]
async fn dropped_handle_stops_its_cursor() {
    let service = service(&["a"]).await;
    let spec = SortSpec::ascending(&[ContactField::FamilyName]);
    let handle = service.create_cursor(spec.clone(), None).await.unwrap();
    let mut other = mirror(&service).await;
    assert_eq!(service.store().ordering_users(&spec).unwrap(), 2);

    drop(handle);
    timeout(Duration::from_secs(5), async {
        while service.store().ordering_users(&spec).unwrap() > 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("dropped handle kept its cursor");

    // The surviving mirror still pages.
    let page = other.step(MOVE_FETCH, StepOrigin::Begin, 1, None).await.unwrap();
    assert_eq!(page.records.len(), 1);
    other.free().await.unwrap();
    assert_eq!(service.store().ordering_users(&spec).unwrap(), 0);
}
