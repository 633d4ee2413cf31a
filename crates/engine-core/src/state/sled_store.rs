use crate::{
    error::RecordLogError,
    state::{RecordLog, models::StoreMeta},
};
use async_trait::async_trait;
use model::records::record::Record;
use std::path::Path;

const RECORD_PREFIX: &str = "rec:";
const META_KEY: &str = "meta";

/// Sled backed [`RecordLog`]. Records are stored as JSON because their
/// payload is free-form; metadata uses bincode.
pub struct SledRecordLog {
    db: sled::Db,
}

impl SledRecordLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecordLogError> {
        let db = sled::open(path).map_err(|e| RecordLogError::Open(e.to_string()))?;
        Ok(Self { db })
    }

    #[inline]
    fn record_key(uid: &str) -> String {
        format!("{RECORD_PREFIX}{uid}")
    }
}

#[async_trait]
impl RecordLog for SledRecordLog {
    async fn put_record(&self, record: &Record) -> Result<(), RecordLogError> {
        let bytes =
            serde_json::to_vec(record).map_err(|e| RecordLogError::Write(e.to_string()))?;
        self.db
            .insert(Self::record_key(&record.uid), bytes)
            .map_err(|e| RecordLogError::Write(e.to_string()))?;
        Ok(())
    }

    async fn delete_record(&self, uid: &str) -> Result<(), RecordLogError> {
        self.db
            .remove(Self::record_key(uid))
            .map_err(|e| RecordLogError::Write(e.to_string()))?;
        Ok(())
    }

    async fn load_records(&self) -> Result<Vec<Record>, RecordLogError> {
        let mut records = Vec::new();

        for item in self.db.scan_prefix(RECORD_PREFIX) {
            let (_key, value) = item.map_err(|e| RecordLogError::Read(e.to_string()))?;
            let record: Record =
                serde_json::from_slice(&value).map_err(|e| RecordLogError::Read(e.to_string()))?;
            records.push(record);
        }

        Ok(records)
    }

    async fn save_meta(&self, meta: &StoreMeta) -> Result<(), RecordLogError> {
        let bytes = bincode::serialize(meta).map_err(|e| RecordLogError::Write(e.to_string()))?;
        self.db
            .insert(META_KEY, bytes)
            .map_err(|e| RecordLogError::Write(e.to_string()))?;
        self.db
            .flush_async()
            .await
            .map_err(|e| RecordLogError::Write(e.to_string()))?;
        Ok(())
    }

    async fn load_meta(&self) -> Result<Option<StoreMeta>, RecordLogError> {
        match self
            .db
            .get(META_KEY)
            .map_err(|e| RecordLogError::Read(e.to_string()))?
        {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes).map_err(|e| RecordLogError::Read(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collation::Locale;
    use model::records::field::ContactField;
    use tempfile::tempdir;

    #[tokio::test]
    async fn replays_records_and_meta() {
        let dir = tempdir().unwrap();
        let log = SledRecordLog::open(dir.path()).unwrap();
        log.put_record(
            &Record::new("a")
                .with_field(ContactField::FamilyName, "Müller")
                .with_payload(serde_json::json!({"vcard": "BEGIN:VCARD"})),
        )
        .await
        .unwrap();
        log.put_record(&Record::new("b")).await.unwrap();
        log.delete_record("b").await.unwrap();
        log.save_meta(&StoreMeta {
            locale: Locale::parse("de_DE").unwrap(),
            revision_counter: 7,
        })
        .await
        .unwrap();

        let records = log.load_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(ContactField::FamilyName), Some("Müller"));
        assert_eq!(records[0].payload["vcard"], "BEGIN:VCARD");

        let meta = log.load_meta().await.unwrap().unwrap();
        assert_eq!(meta.locale.canonical(), "de_DE");
        assert_eq!(meta.revision_counter, 7);
    }

    #[tokio::test]
    async fn empty_log_has_no_meta() {
        let dir = tempdir().unwrap();
        let log = SledRecordLog::open(dir.path()).unwrap();
        assert!(log.load_meta().await.unwrap().is_none());
        assert!(log.load_records().await.unwrap().is_empty());
    }
}
