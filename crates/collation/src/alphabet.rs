use crate::key::CollationKey;

/// Display label of the underflow bucket. Never a jump target.
pub const UNDERFLOW_LABEL: &str = "…";

/// Letter sets used to build alphabetic indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    /// Latin followed by `Å Ä Ö` (Swedish, Finnish).
    Nordic,
    Greek,
    Cyrillic,
    /// No meaningful letter buckets; only the underflow label.
    Unbucketed,
}

impl Script {
    pub fn letters(self) -> Vec<String> {
        let latin = ('A'..='Z').map(String::from);
        match self {
            Script::Latin => latin.collect(),
            Script::Nordic => latin.chain(["Å", "Ä", "Ö"].map(String::from)).collect(),
            Script::Greek => "ΑΒΓΔΕΖΗΘΙΚΛΜΝΞΟΠΡΣΤΥΦΧΨΩ"
                .chars()
                .map(String::from)
                .collect(),
            Script::Cyrillic => "АБВГДЕЖЗИКЛМНОПРСТУФХЦЧШЩЭЮЯ"
                .chars()
                .map(String::from)
                .collect(),
            Script::Unbucketed => Vec::new(),
        }
    }
}

/// Ordered bucket labels for a locale together with the key each bucket
/// starts at. Label 0 is the underflow bucket and starts before every key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    labels: Vec<String>,
    keys: Vec<CollationKey>,
}

impl Alphabet {
    /// Builds an alphabet from jump labels and a function that yields the
    /// starting key of each label. Keys must be ascending.
    pub fn new<F>(letters: Vec<String>, mut start_key: F) -> Self
    where
        F: FnMut(&str) -> CollationKey,
    {
        let mut labels = Vec::with_capacity(letters.len() + 1);
        let mut keys = Vec::with_capacity(letters.len() + 1);
        labels.push(UNDERFLOW_LABEL.to_string());
        keys.push(CollationKey::underflow());

        for letter in letters {
            let key = start_key(&letter);
            debug_assert!(keys.last().is_none_or(|prev| *prev < key));
            keys.push(key);
            labels.push(letter);
        }

        Self { labels, keys }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// True when the only label is the underflow marker.
    pub fn is_degenerate(&self) -> bool {
        self.labels.len() <= 1
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// The key a bucket starts at. It sorts at or before every key that
    /// belongs to the bucket and after every key of the previous bucket.
    pub fn start_key(&self, index: usize) -> Option<&CollationKey> {
        self.keys.get(index)
    }

    /// Index of the bucket a sort key falls into.
    pub fn bucket_of(&self, key: &CollationKey) -> usize {
        self.keys
            .partition_point(|start| start <= key)
            .saturating_sub(1)
    }
}
