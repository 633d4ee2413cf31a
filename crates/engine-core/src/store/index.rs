use model::{
    pagination::{
        key::{IndexKey, KeyPart},
        sort::SortSpec,
    },
    records::field::ContactField,
};
use collation::CollationKey;
use std::collections::{BTreeSet, HashMap};

/// Collation keys of one record's sortable fields under the active locale.
pub(crate) type FieldKeys = HashMap<ContactField, CollationKey>;

/// Ordered index for one sort specification, shared by every cursor that
/// uses the same ordering.
#[derive(Debug)]
pub(crate) struct OrderIndex {
    pub(crate) entries: BTreeSet<IndexKey>,
    pub(crate) users: usize,
}

impl OrderIndex {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeSet::new(),
            users: 0,
        }
    }
}

pub(crate) fn index_key(spec: &SortSpec, keys: &FieldKeys, uid: &str) -> IndexKey {
    let parts = spec
        .keys()
        .iter()
        .map(|k| {
            let key = keys
                .get(&k.field)
                .cloned()
                .unwrap_or_else(CollationKey::underflow);
            KeyPart::new(key, k.direction)
        })
        .collect();
    IndexKey::new(parts, uid)
}
