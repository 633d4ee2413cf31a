use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the primary, secondary and tertiary levels of a key.
/// Every real weight is strictly greater, so a shorter level always sorts
/// before a longer one that shares its prefix.
pub(crate) const LEVEL_SEPARATOR: u32 = 1;

/// A precomputed sort key. Two keys compare exactly as their source strings
/// compare under the collator that produced them.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollationKey(Vec<u32>);

impl CollationKey {
    /// The key of the underflow bucket. Sorts before every other key,
    /// including the key of an empty string.
    pub fn underflow() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn from_weights(weights: Vec<u32>) -> Self {
        Self(weights)
    }

    pub fn weights(&self) -> &[u32] {
        &self.0
    }

    pub fn is_underflow(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CollationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollationKey(")?;
        for (i, w) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{w:x}")?;
        }
        f.write_str(")")
    }
}
