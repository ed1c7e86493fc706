//! LR record collection adapter.
//!
//! Translates the record operations the lifecycle manager needs into
//! queries against the `lr_records` table.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::LrRecord;

use super::Storage;

/// Operations on the LR record collection.
///
/// "Not found" is reported as `None`, never as an error. Implementations
/// must reject a second live record with the same key on their own, even
/// when the caller has already checked with [`RecordStore::find_by_key`].
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Get every record. No ordering is guaranteed.
    async fn find_all(&self) -> Result<Vec<LrRecord>>;

    /// Get the record holding exactly `lr_num`.
    async fn find_by_key(&self, lr_num: &str) -> Result<Option<LrRecord>>;

    /// Write a new record and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the key is missing, [`Error::DuplicateRecord`]
    /// if the key is already taken.
    async fn insert(&self, record: LrRecord) -> Result<LrRecord>;

    /// Merge `patch` onto `existing` and persist the result.
    ///
    /// # Errors
    ///
    /// [`Error::RecordNotFound`] if `existing` was removed in the meantime,
    /// [`Error::DuplicateRecord`] if the merged key collides with another record.
    async fn update_in_place(
        &self,
        existing: &LrRecord,
        patch: &Map<String, Value>,
    ) -> Result<LrRecord>;

    /// Remove the record holding `lr_num` and return it.
    async fn delete_by_key(&self, lr_num: &str) -> Result<Option<LrRecord>>;
}

/// [`RecordStore`] backed by the `SQLite` `lr_records` table.
///
/// Uniqueness is enforced by the `idx_lr_records_lr_num` unique index.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    storage: Storage,
}

impl SqliteRecordStore {
    /// Create an adapter over the given storage handle.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Convert a database row to an `LrRecord`.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<LrRecord> {
        let id: i64 = row.get(0)?;
        let document: String = row.get(1)?;

        let mut record: LrRecord = serde_json::from_str(&document).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        record.id = Some(id);
        Ok(record)
    }

    fn select_by_key(conn: &Connection, lr_num: &str) -> Result<Option<LrRecord>> {
        let record = conn
            .query_row(
                "SELECT id, document FROM lr_records WHERE lr_num = ?1",
                [lr_num],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }
}

/// Map a store-level unique constraint violation to [`Error::DuplicateRecord`].
fn map_unique_violation(err: Error) -> Error {
    if err.is_unique_violation() {
        Error::DuplicateRecord
    } else {
        err
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_all(&self) -> Result<Vec<LrRecord>> {
        self.storage
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id, document FROM lr_records ORDER BY id")?;
                let records = stmt
                    .query_map([], Self::row_to_record)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
    }

    async fn find_by_key(&self, lr_num: &str) -> Result<Option<LrRecord>> {
        let lr_num = lr_num.to_owned();
        self.storage
            .call(move |conn| Self::select_by_key(conn, &lr_num))
            .await
    }

    async fn insert(&self, record: LrRecord) -> Result<LrRecord> {
        let key = record.key()?.to_owned();
        let document = record.to_document()?;

        let id = self
            .storage
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO lr_records (lr_num, document) VALUES (?1, ?2)",
                    params![key, document],
                )
                .map_err(|e| map_unique_violation(e.into()))?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!("Inserted LR record with id {}", id);
        Ok(LrRecord {
            id: Some(id),
            ..record
        })
    }

    async fn update_in_place(
        &self,
        existing: &LrRecord,
        patch: &Map<String, Value>,
    ) -> Result<LrRecord> {
        let id = existing
            .id
            .ok_or_else(|| Error::internal("cannot update a record that was never stored"))?;
        let merged = existing.merged_with(patch)?;
        let key = merged.key()?.to_owned();
        let document = merged.to_document()?;

        let affected = self
            .storage
            .call(move |conn| {
                conn.execute(
                    r"
                    UPDATE lr_records
                    SET lr_num = ?1, document = ?2, updated_at = datetime('now')
                    WHERE id = ?3
                    ",
                    params![key, document, id],
                )
                .map_err(|e| map_unique_violation(e.into()))
            })
            .await?;

        if affected == 0 {
            return Err(Error::RecordNotFound);
        }
        debug!("Updated LR record with id {}", id);
        Ok(merged)
    }

    async fn delete_by_key(&self, lr_num: &str) -> Result<Option<LrRecord>> {
        let lr_num = lr_num.to_owned();
        let deleted = self
            .storage
            .call(move |conn| {
                let tx = conn.transaction()?;
                let found = Self::select_by_key(&tx, &lr_num)?;
                if let Some(record) = &found {
                    tx.execute("DELETE FROM lr_records WHERE id = ?1", [record.id])?;
                }
                tx.commit()?;
                Ok(found)
            })
            .await?;

        if let Some(record) = &deleted {
            debug!("Deleted LR record with id {:?}", record.id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_store() -> SqliteRecordStore {
        SqliteRecordStore::new(Storage::open_in_memory().expect("failed to create test storage"))
    }

    fn record(document: Value) -> LrRecord {
        LrRecord::from_document(document).unwrap()
    }

    #[tokio::test]
    async fn test_find_all_empty() {
        let store = create_test_store();
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = create_test_store();
        let stored = store
            .insert(record(json!({"lrNum": "LR1", "party": "Acme"})))
            .await
            .unwrap();

        assert!(stored.id.is_some());
        assert_eq!(stored.party.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_insert_and_find_by_key() {
        let store = create_test_store();
        let stored = store.insert(record(json!({"lrNum": "LR1"}))).await.unwrap();

        let found = store.find_by_key("LR1").await.unwrap();
        assert_eq!(found, Some(stored));
        assert!(store.find_by_key("LR2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_key_is_exact_match() {
        let store = create_test_store();
        store.insert(record(json!({"lrNum": "LR1"}))).await.unwrap();

        assert!(store.find_by_key("lr1").await.unwrap().is_none());
        assert!(store.find_by_key("LR").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_rejected_by_store() {
        let store = create_test_store();
        store.insert(record(json!({"lrNum": "LR1"}))).await.unwrap();

        let err = store
            .insert(record(json!({"lrNum": "LR1", "party": "Other"})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_missing_key_rejected() {
        let store = create_test_store();
        let err = store
            .insert(record(json!({"party": "Acme"})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_find_all_returns_every_record() {
        let store = create_test_store();
        for i in 0..5 {
            store
                .insert(record(json!({"lrNum": format!("LR{i}")})))
                .await
                .unwrap();
        }

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.id.is_some()));
    }

    #[tokio::test]
    async fn test_update_in_place_merges_and_persists() {
        let store = create_test_store();
        let stored = store
            .insert(record(json!({"lrNum": "LR1", "party": "Acme", "freight": "100"})))
            .await
            .unwrap();

        let patch = json!({"freight": "250"});
        let updated = store
            .update_in_place(&stored, patch.as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(updated.freight.as_deref(), Some("250"));
        assert_eq!(updated.party.as_deref(), Some("Acme"));

        let reloaded = store.find_by_key("LR1").await.unwrap().unwrap();
        assert_eq!(reloaded, updated);
    }

    #[tokio::test]
    async fn test_update_in_place_unique_violation() {
        let store = create_test_store();
        store.insert(record(json!({"lrNum": "LR1"}))).await.unwrap();
        let second = store.insert(record(json!({"lrNum": "LR2"}))).await.unwrap();

        let patch = json!({"lrNum": "LR1"});
        let err = store
            .update_in_place(&second, patch.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord));
    }

    #[tokio::test]
    async fn test_update_in_place_after_removal() {
        let store = create_test_store();
        let stored = store.insert(record(json!({"lrNum": "LR1"}))).await.unwrap();
        store.delete_by_key("LR1").await.unwrap();

        let patch = json!({"party": "Late"});
        let err = store
            .update_in_place(&stored, patch.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RecordNotFound));
    }

    #[tokio::test]
    async fn test_delete_by_key_returns_record() {
        let store = create_test_store();
        let stored = store
            .insert(record(json!({"lrNum": "LR1", "party": "Acme"})))
            .await
            .unwrap();

        let deleted = store.delete_by_key("LR1").await.unwrap();
        assert_eq!(deleted, Some(stored));
        assert!(store.find_by_key("LR1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_nonexistent() {
        let store = create_test_store();
        assert!(store.delete_by_key("LR404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_key_reusable_after_delete() {
        let store = create_test_store();
        store.insert(record(json!({"lrNum": "LR1"}))).await.unwrap();
        store.delete_by_key("LR1").await.unwrap();

        let again = store
            .insert(record(json!({"lrNum": "LR1", "party": "New"})))
            .await
            .unwrap();
        assert_eq!(again.party.as_deref(), Some("New"));
    }

    #[tokio::test]
    async fn test_corrupt_document_surfaces_error() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .call(|conn| {
                conn.execute(
                    "INSERT INTO lr_records (lr_num, document) VALUES ('LR1', 'not json')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let store = SqliteRecordStore::new(storage);
        let err = store.find_all().await.unwrap_err();
        assert!(matches!(err, Error::DatabaseQuery(_)));
    }
}
