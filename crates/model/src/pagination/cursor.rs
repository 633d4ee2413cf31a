use crate::pagination::key::IndexKey;
use collation::Locale;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Values a store-side cursor pushes to its client mirror.
///
/// `seq` increases with every snapshot a cursor produces, so a mirror can
/// drop snapshots that arrive after a newer one has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub seq: u64,
    pub total: u32,
    pub position: u32,
    pub revision: String,
    pub locale: Locale,
    pub alphabet: AlphabetSnapshot,
}

/// Labels of the active alphabet plus the bucket the cursor currently sits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphabetSnapshot {
    pub labels: Arc<[String]>,
    pub current_index: u32,
}

impl AlphabetSnapshot {
    pub fn n_labels(&self) -> u32 {
        self.labels.len() as u32
    }
}

/// Where a store-side cursor points.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PositionToken {
    #[default]
    BeforeFirst,
    AfterLast,
    /// The last record visited.
    Record(IndexKey),
    /// Just before the first record at or after an alphabet label.
    Boundary { label: usize, probe: IndexKey },
}
