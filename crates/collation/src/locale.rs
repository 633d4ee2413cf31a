use crate::error::{CollationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A parsed locale identifier such as `en_US.UTF-8`, `de_DE@euro` or `POSIX`.
///
/// Encoding and modifier suffixes are accepted and dropped; they never
/// influence ordering. The language tag is lowercased and the country tag
/// uppercased, so `EN-us` and `en_US.utf8` name the same locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    const POSIX: &'static str = "posix";

    /// The `C`/`POSIX` locale: case significant, byte-like ordering.
    pub fn posix() -> Self {
        Self {
            language: Self::POSIX.to_string(),
            country: None,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CollationError::EmptyLocale);
        }

        let base = trimmed
            .split(['.', '@'])
            .next()
            .unwrap_or(trimmed)
            .trim();

        if base == "C" || base.eq_ignore_ascii_case("posix") {
            return Ok(Self::posix());
        }

        let mut parts = base.split(['_', '-']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();

        if language.len() < 2
            || language.len() > 3
            || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(CollationError::InvalidLanguage {
                locale: s.to_string(),
                language,
            });
        }

        let country = parts
            .next()
            .filter(|c| !c.is_empty())
            .map(|c| c.to_ascii_uppercase());

        debug!(
            locale = %s,
            language = %language,
            country = country.as_deref().unwrap_or("(none)"),
            "parsed locale"
        );

        Ok(Self { language, country })
    }

    pub fn is_posix(&self) -> bool {
        self.language == Self::POSIX
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Canonical string form (e.g. `"de_DE"`, `"POSIX"`).
    pub fn canonical(&self) -> String {
        if self.is_posix() {
            return "POSIX".to_string();
        }
        match &self.country {
            Some(c) => format!("{}_{c}", self.language),
            None => self.language.clone(),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::posix()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl std::str::FromStr for Locale {
    type Err = CollationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = CollationError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language_and_country() {
        let loc = Locale::parse("en_US").unwrap();
        assert_eq!(loc.language(), "en");
        assert_eq!(loc.country(), Some("US"));
        assert!(!loc.is_posix());
    }

    #[test]
    fn drops_encoding_and_modifier() {
        assert_eq!(
            Locale::parse("en_US.UTF-8").unwrap(),
            Locale::parse("en_US").unwrap()
        );
        assert_eq!(
            Locale::parse("de_DE@euro").unwrap().canonical(),
            "de_DE".to_string()
        );
    }

    #[test]
    fn normalizes_case_and_separator() {
        assert_eq!(Locale::parse("FR-ca").unwrap().canonical(), "fr_CA");
    }

    #[test]
    fn c_and_posix_are_the_same_locale() {
        assert!(Locale::parse("C").unwrap().is_posix());
        assert!(Locale::parse("POSIX").unwrap().is_posix());
        assert!(Locale::parse("C.UTF-8").unwrap().is_posix());
        assert_eq!(Locale::parse("C").unwrap().to_string(), "POSIX");
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert_eq!(Locale::parse("  "), Err(CollationError::EmptyLocale));
        assert!(matches!(
            Locale::parse("x_US"),
            Err(CollationError::InvalidLanguage { .. })
        ));
        assert!(matches!(
            Locale::parse("e1_US"),
            Err(CollationError::InvalidLanguage { .. })
        ));
    }

    #[test]
    fn serde_uses_canonical_string() {
        let loc = Locale::parse("de_DE.UTF-8").unwrap();
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, "\"de_DE\"");
        let back: Locale = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);
    }
}
