use crate::pagination::sort::SortDirection;
use collation::CollationKey;
use std::cmp::Reverse;

/// One sort column of an index key, wrapped so that plain `Ord` already
/// honours the column's direction. All keys of one index share the same
/// variant at each column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    Ascending(CollationKey),
    Descending(Reverse<CollationKey>),
}

impl KeyPart {
    pub fn new(key: CollationKey, direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => KeyPart::Ascending(key),
            SortDirection::Descending => KeyPart::Descending(Reverse(key)),
        }
    }

    pub fn collation_key(&self) -> &CollationKey {
        match self {
            KeyPart::Ascending(key) => key,
            KeyPart::Descending(Reverse(key)) => key,
        }
    }
}

/// Composite key of an index entry: the sort columns followed by `uid`,
/// which breaks every remaining tie.
///
/// A probe carries only a leading column. Because a shorter column list
/// sorts first, a probe lands immediately before every entry whose first
/// column equals it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexKey {
    parts: Vec<KeyPart>,
    uid: String,
}

impl IndexKey {
    pub fn new(parts: Vec<KeyPart>, uid: impl Into<String>) -> Self {
        IndexKey {
            parts,
            uid: uid.into(),
        }
    }

    pub fn probe(first: KeyPart) -> Self {
        IndexKey {
            parts: vec![first],
            uid: String::new(),
        }
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn first(&self) -> Option<&KeyPart> {
        self.parts.first()
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }
}
