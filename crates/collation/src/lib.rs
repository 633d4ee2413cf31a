//! Locale aware ordering and alphabetic bucketing for sort-key strings.
//!
//! A [`Collator`] turns strings into [`CollationKey`]s whose byte-wise order
//! is the locale's order, and exposes the locale's [`Alphabet`] of jump
//! labels. [`CollatorProvider`] resolves locale identifiers into collators.

pub mod alphabet;
pub mod error;
pub mod key;
pub mod locale;
pub mod provider;
pub mod rules;
mod weights;

pub use alphabet::{Alphabet, Script, UNDERFLOW_LABEL};
pub use error::{CollationError, Result};
pub use key::CollationKey;
pub use locale::Locale;
pub use provider::{BuiltinCollators, CollatorProvider};
pub use rules::{RuleCollator, Tailoring};

use std::{cmp::Ordering, fmt::Debug};

/// Total order over sort-key strings for one locale.
pub trait Collator: Send + Sync + Debug {
    fn locale(&self) -> &Locale;

    /// Precompute the key of `text`. Equal keys mean the strings are
    /// indistinguishable under this locale.
    fn sort_key(&self, text: &str) -> CollationKey;

    fn compare(&self, a: &str, b: &str) -> Ordering {
        self.sort_key(a).cmp(&self.sort_key(b))
    }

    fn alphabet(&self) -> &Alphabet;

    fn labels(&self) -> &[String] {
        self.alphabet().labels()
    }

    /// Bucket of `text` in this locale's alphabet.
    fn alphabetic_index(&self, text: &str) -> usize {
        self.alphabet().bucket_of(&self.sort_key(text))
    }
}
