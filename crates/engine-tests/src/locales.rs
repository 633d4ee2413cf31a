#[cfg(test)]
mod tests {
    use crate::{
        fixture_mirror, fixture_service, until_refresh,
        utils::{DE_DE_ORDER, EN_US_ORDER, FR_CA_ORDER, POSIX_ORDER, numbers},
    };
    use collation::Locale;
    use engine_core::error::CursorError;
    use engine_runtime::CursorMirror;
    use model::{
        events::cursor::CursorEvent,
        pagination::step::{StepFlags, StepOrigin},
    };
    use tracing_test::traced_test;

    async fn full_order(mirror: &mut CursorMirror) -> Vec<usize> {
        let flags = StepFlags::MOVE | StepFlags::FETCH;
        let mut seen = numbers(&mirror.step(flags, StepOrigin::Begin, 10, None).await.unwrap());
        seen.extend(numbers(
            &mirror.step(flags, StepOrigin::Current, 10, None).await.unwrap(),
        ));
        seen
    }

    #[traced_test]
    #[tokio::test]
    async fn each_locale_orders_the_fixture() {
        for (locale, expected) in [
            ("POSIX", POSIX_ORDER),
            ("en_US", EN_US_ORDER),
            ("fr_CA", FR_CA_ORDER),
            ("de_DE", DE_DE_ORDER),
        ] {
            let service = fixture_service(locale).await;
            let mut mirror = fixture_mirror(&service).await;
            assert_eq!(mirror.total(), 20, "{locale}");
            assert_eq!(full_order(&mut mirror).await, expected, "{locale}");
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn switching_locale_rewinds_and_reorders() {
        let service = fixture_service("POSIX").await;
        let mut mirror = fixture_mirror(&service).await;
        let mut events = mirror.subscribe();

        mirror
            .step(StepFlags::MOVE, StepOrigin::Begin, 5, None)
            .await
            .unwrap();
        assert_eq!(events.recv().await, Some(CursorEvent::PositionChanged(5)));

        service.set_locale(Locale::parse("en_US").unwrap()).await.unwrap();
        assert_eq!(
            until_refresh(&mut events).await,
            vec![
                CursorEvent::PositionChanged(0),
                CursorEvent::AlphabetChanged,
                CursorEvent::Refresh
            ]
        );
        assert_eq!(mirror.locale().canonical(), "en_US");
        assert_eq!(mirror.total(), 20);
        assert!(logs_contain("store locale changed"));

        assert_eq!(full_order(&mut mirror).await, EN_US_ORDER);

        service.set_locale(Locale::parse("de_DE").unwrap()).await.unwrap();
        until_refresh(&mut events).await;
        assert_eq!(full_order(&mut mirror).await, DE_DE_ORDER);
    }

    #[traced_test]
    #[tokio::test]
    async fn setting_the_same_locale_changes_nothing() {
        let service = fixture_service("en_US").await;
        let mirror = fixture_mirror(&service).await;
        let revision = mirror.revision();

        let unchanged = service
            .set_locale(Locale::parse("en_US.UTF-8").unwrap())
            .await
            .unwrap();
        assert_eq!(unchanged, revision);
    }

    #[traced_test]
    #[tokio::test]
    async fn greek_alphabet_replaces_latin_labels() {
        let service = fixture_service("en_US").await;
        let mirror = fixture_mirror(&service).await;
        let mut events = mirror.subscribe();

        service.set_locale(Locale::parse("el_GR").unwrap()).await.unwrap();
        let seen = until_refresh(&mut events).await;
        assert!(seen.contains(&CursorEvent::AlphabetChanged));

        let alphabet = mirror.alphabet();
        assert_eq!(alphabet.n_labels(), 25);
        assert_eq!(alphabet.labels[1], "Α");
        assert_eq!(alphabet.labels[24], "Ω");
    }

    #[traced_test]
    #[tokio::test]
    async fn unbucketed_locale_only_has_underflow() {
        let service = fixture_service("ja_JP").await;
        let mut mirror = fixture_mirror(&service).await;
        let mut events = mirror.subscribe();

        assert_eq!(mirror.alphabet().n_labels(), 1);
        mirror
            .step(StepFlags::MOVE, StepOrigin::Begin, 5, None)
            .await
            .unwrap();
        assert_eq!(mirror.position(), 5);

        // With a single label there is nothing to jump to.
        mirror.set_target_alphabetic_index(0).await.unwrap();
        until_refresh(&mut events).await;
        assert_eq!(mirror.position(), 5);
        assert!(matches!(
            mirror.set_target_alphabetic_index(1).await,
            Err(CursorError::InvalidQuery(_))
        ));
    }

    #[traced_test]
    #[tokio::test]
    async fn nordic_letters_sort_after_z() {
        let service = fixture_service("sv_SE").await;
        let mirror = fixture_mirror(&service).await;
        let labels = mirror.alphabet().labels;

        assert_eq!(labels.len(), 30);
        assert_eq!(&labels[27..], ["Å", "Ä", "Ö"]);
    }
}
