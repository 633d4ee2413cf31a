//! Readers paging through the book on their own threads while a writer
//! keeps adding and removing contacts.

#[cfg(test)]
mod tests {
    use crate::utils::{by_name, fixture_records, uid};
    use collation::{BuiltinCollators, Collator, CollatorProvider, Locale};
    use engine_config::settings::CursorSettings;
    use engine_core::error::CursorError;
    use engine_runtime::{BookService, CursorMirror};
    use model::{
        events::cursor::CursorEvent,
        pagination::step::{StepFlags, StepOrigin, StepResult},
        records::{field::ContactField, record::Record},
    };
    use std::{
        collections::HashSet,
        sync::Arc,
        thread,
        time::Duration,
    };
    use tokio::runtime::Builder;
    use tracing_test::traced_test;

    const PAGE: i32 = 7;
    const PASSES: usize = 15;
    const WRITES: usize = 20;

    fn service(runtime: &tokio::runtime::Runtime) -> Arc<BookService> {
        let settings = CursorSettings {
            locale: "POSIX".into(),
            out_of_sync_retries: 100,
            ..CursorSettings::default()
        }
        .validate()
        .unwrap();
        let service = BookService::new(settings, runtime.handle().clone()).unwrap();
        runtime.block_on(async {
            for record in fixture_records() {
                service.add_record(record).await.unwrap();
            }
        });
        Arc::new(service)
    }

    fn written(i: usize) -> Record {
        // Alternate between the front and the back of the list.
        let family = if i % 2 == 0 { "Aaron" } else { "Zimmer" };
        Record::new(format!("writer-{i}"))
            .with_field(ContactField::FamilyName, format!("{family}{i:02}"))
    }

    /// Checks one page against the collator and collects its uids.
    fn check_page(page: &StepResult, collator: &dyn Collator, seen: &mut HashSet<String>) {
        for pair in page.records.windows(2) {
            let a = pair[0].sort_value(ContactField::FamilyName);
            let b = pair[1].sort_value(ContactField::FamilyName);
            assert!(collator.compare(a, b).is_le(), "{a:?} sorted before {b:?}");
        }
        for record in &page.records {
            assert!(seen.insert(record.uid.clone()), "{} seen twice", record.uid);
        }
    }

    /// Pages from the start to the end with the built-in retry.
    fn pass_with_retry(mirror: &mut CursorMirror, collator: &dyn Collator) -> HashSet<String> {
        let flags = StepFlags::MOVE | StepFlags::FETCH;
        let mut seen = HashSet::new();
        let mut origin = StepOrigin::Begin;
        loop {
            match mirror.step_with_retry_blocking(flags, origin, PAGE, None) {
                Ok(page) => {
                    check_page(&page, collator, &mut seen);
                    if page.records.len() < PAGE as usize {
                        return seen;
                    }
                }
                Err(CursorError::QueryRefused { .. }) => return seen,
                Err(err) => panic!("step failed: {err}"),
            }
            assert!(mirror.position() <= mirror.total() + 1);
            origin = StepOrigin::Current;
        }
    }

    /// Pages from the start to the end, waiting for a refresh by hand after
    /// every out-of-sync reply.
    fn pass_by_hand(mirror: &mut CursorMirror, collator: &dyn Collator) -> HashSet<String> {
        let flags = StepFlags::MOVE | StepFlags::FETCH;
        let mut events = mirror.subscribe();
        let mut seen = HashSet::new();
        let mut origin = StepOrigin::Begin;
        loop {
            while events.try_recv().is_ok() {}
            match mirror.step_blocking(flags, origin, PAGE, None) {
                Ok(page) => {
                    check_page(&page, collator, &mut seen);
                    if page.records.len() < PAGE as usize {
                        return seen;
                    }
                    origin = StepOrigin::Current;
                }
                Err(CursorError::OutOfSync { .. }) => {
                    assert!(mirror.is_out_of_sync());
                    while let Some(event) = events.blocking_recv() {
                        if event == CursorEvent::Refresh {
                            break;
                        }
                    }
                }
                Err(CursorError::QueryRefused { .. }) => return seen,
                Err(err) => panic!("step failed: {err}"),
            }
        }
    }

    #[traced_test]
    #[test]
    fn readers_never_see_a_torn_book() {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let service = service(&runtime);
        let collator = BuiltinCollators::shared().collator(&Locale::posix()).unwrap();
        let fixture: HashSet<String> = (1..=20).map(uid).collect();

        let readers: Vec<_> = (0..3)
            .map(|n| {
                let service = service.clone();
                let collator = collator.clone();
                let fixture = fixture.clone();
                thread::spawn(move || {
                    let mut mirror = service.create_mirror_blocking(by_name(), None).unwrap();
                    for _ in 0..PASSES {
                        let seen = if n == 0 {
                            pass_by_hand(&mut mirror, collator.as_ref())
                        } else {
                            pass_with_retry(&mut mirror, collator.as_ref())
                        };
                        // Contacts present throughout are never skipped.
                        assert!(seen.is_superset(&fixture), "reader {n} skipped a contact");
                    }
                    mirror
                })
            })
            .collect();

        let writer = {
            let service = service.clone();
            let runtime = runtime.handle().clone();
            thread::spawn(move || {
                for i in 0..WRITES {
                    runtime.block_on(service.add_record(written(i))).unwrap();
                    thread::sleep(Duration::from_millis(3));
                }
                for i in 0..WRITES {
                    runtime
                        .block_on(service.remove_record(&format!("writer-{i}")))
                        .unwrap();
                    thread::sleep(Duration::from_millis(3));
                }
            })
        };

        writer.join().unwrap();
        for reader in readers {
            let mut mirror = reader.join().unwrap();
            // The writer removed everything it added.
            assert_eq!(mirror.calculate_blocking().unwrap().0, 20);
            mirror.free_blocking().unwrap();
        }

        assert!(service.metrics().snapshot().refreshes > 0);
        assert_eq!(service.store().len().unwrap(), 20);
        drop(service);
        runtime.shutdown_timeout(Duration::from_secs(1));
    }
}
