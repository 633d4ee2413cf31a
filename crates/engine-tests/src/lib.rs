#![allow(dead_code)]

use engine_config::settings::{CursorSettings, validated::ValidatedSettings};
use engine_runtime::{BookService, CursorMirror};
use model::events::cursor::CursorEvent;
use std::time::Duration;
use tokio::{runtime::Handle, sync::mpsc, time::timeout};
use utils::{by_name, fixture_records};

pub mod concurrency;
pub mod locales;
pub mod utils;

/// Settings for a fixture service running under `locale`.
pub fn settings(locale: &str) -> ValidatedSettings {
    CursorSettings {
        locale: locale.to_string(),
        ..CursorSettings::default()
    }
    .validate()
    .expect("valid fixture settings")
}

/// A service holding the twenty fixture contacts.
pub async fn fixture_service(locale: &str) -> BookService {
    let service = BookService::new(settings(locale), Handle::current()).expect("create service");
    for record in fixture_records() {
        service.add_record(record).await.expect("add fixture record");
    }
    service
}

/// A mirror over the fixture, ordered by family name then given name.
pub async fn fixture_mirror(service: &BookService) -> CursorMirror {
    service
        .create_mirror(by_name(), None)
        .await
        .expect("create mirror")
}

pub async fn next_event(events: &mut mpsc::UnboundedReceiver<CursorEvent>) -> CursorEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for cursor event")
        .expect("cursor event channel closed")
}

/// Collects notifications up to and including the next refresh.
pub async fn until_refresh(events: &mut mpsc::UnboundedReceiver<CursorEvent>) -> Vec<CursorEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        seen.push(event);
        if event == CursorEvent::Refresh {
            return seen;
        }
    }
}
