use crate::records::field::ContactField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One addressable contact.
///
/// `uid` is unique and never changes. Field values are kept as strings;
/// anything the cursor does not interpret lives in `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub uid: String,
    #[serde(default)]
    pub fields: BTreeMap<ContactField, String>,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub revision: String,
}

impl Record {
    pub fn new(uid: impl Into<String>) -> Self {
        Record {
            uid: uid.into(),
            fields: BTreeMap::new(),
            payload: serde_json::Value::Null,
            revision: String::new(),
        }
    }

    pub fn with_field(mut self, field: ContactField, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn get(&self, field: ContactField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Value used for ordering: a missing field sorts like an empty string.
    pub fn sort_value(&self, field: ContactField) -> &str {
        self.get(field).unwrap_or_default()
    }

    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn remove(&mut self, field: ContactField) -> Option<String> {
        self.fields.remove(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_sort_as_empty() {
        let r = Record::new("a").with_field(ContactField::GivenName, "Ann");
        assert_eq!(r.get(ContactField::FamilyName), None);
        assert_eq!(r.sort_value(ContactField::FamilyName), "");
        assert_eq!(r.sort_value(ContactField::GivenName), "Ann");
    }

    #[test]
    fn deserializes_with_defaults() {
        let r: Record = serde_json::from_str(
            r#"{"uid":"c1","fields":{"family_name":"Müller","email":"m@example.com"}}"#,
        )
        .unwrap();
        assert_eq!(r.uid, "c1");
        assert_eq!(r.get(ContactField::FamilyName), Some("Müller"));
        assert!(r.payload.is_null());
        assert!(r.revision.is_empty());
    }
}
