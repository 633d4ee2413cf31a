use crate::{
    Collator,
    error::{CollationError, Result},
    locale::Locale,
    rules::RuleCollator,
};
use std::{
    cmp::Ordering,
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, RwLock},
};
use tracing::info;

/// Resolves locales into collators.
///
/// The store and the client mirror only ever talk to this trait, so tests
/// and embedders can substitute their own ordering rules.
pub trait CollatorProvider: Send + Sync + Debug {
    fn collator(&self, locale: &Locale) -> Result<Arc<dyn Collator>>;

    /// Compare two strings under the named locale.
    fn compare(&self, locale: &str, a: &str, b: &str) -> Result<Ordering> {
        let locale = Locale::parse(locale)?;
        Ok(self.collator(&locale)?.compare(a, b))
    }

    /// Alphabetic index labels of the named locale. Index 0 is the
    /// underflow marker.
    fn labels(&self, locale: &str) -> Result<Vec<String>> {
        let locale = Locale::parse(locale)?;
        Ok(self.collator(&locale)?.alphabet().labels().to_vec())
    }
}

/// Built-in rule collators, cached per locale.
#[derive(Debug, Default)]
pub struct BuiltinCollators {
    cache: RwLock<HashMap<Locale, Arc<dyn Collator>>>,
}

impl BuiltinCollators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn CollatorProvider> {
        Arc::new(Self::new())
    }
}

impl CollatorProvider for BuiltinCollators {
    fn collator(&self, locale: &Locale) -> Result<Arc<dyn Collator>> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|_| CollationError::RegistryPoisoned)?;
            if let Some(existing) = cache.get(locale) {
                return Ok(existing.clone());
            }
        }

        let mut cache = self
            .cache
            .write()
            .map_err(|_| CollationError::RegistryPoisoned)?;
        let collator = cache
            .entry(locale.clone())
            .or_insert_with(|| {
                info!(locale = %locale, "loading collator");
                Arc::new(RuleCollator::new(locale.clone()))
            })
            .clone();

        Ok(collator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_collators_per_locale() {
        let provider = BuiltinCollators::new();
        let a = provider.collator(&Locale::parse("en_US").unwrap()).unwrap();
        let b = provider
            .collator(&Locale::parse("en_US.UTF-8").unwrap())
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn compare_by_locale_name() {
        let provider = BuiltinCollators::new();
        assert_eq!(
            provider.compare("POSIX", "bad", "Bat").unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            provider.compare("en_US.UTF-8", "bad", "Bat").unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn labels_by_locale_name() {
        let provider = BuiltinCollators::new();
        assert_eq!(provider.labels("ko_KR").unwrap().len(), 1);
        assert_eq!(provider.labels("C").unwrap()[26], "Z");
        assert!(provider.labels("").is_err());
    }
}
