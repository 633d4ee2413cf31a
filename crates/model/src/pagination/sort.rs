use crate::records::field::ContactField;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: ContactField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: ContactField) -> Self {
        SortKey {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: ContactField) -> Self {
        SortKey {
            field,
            direction: SortDirection::Descending,
        }
    }
}

/// Ordering contract of a cursor. `uid` always breaks remaining ties, so
/// it never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec(Vec<SortKey>);

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        SortSpec(keys)
    }

    pub fn ascending(fields: &[ContactField]) -> Self {
        SortSpec(fields.iter().copied().map(SortKey::ascending).collect())
    }

    pub fn then(mut self, key: SortKey) -> Self {
        self.0.push(key);
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn primary(&self) -> Option<&SortKey> {
        self.0.first()
    }

    pub fn fields(&self) -> impl Iterator<Item = ContactField> + '_ {
        self.0.iter().map(|k| k.field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let dir = match key.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            write!(f, "{} {dir}", key.field)?;
        }
        Ok(())
    }
}
