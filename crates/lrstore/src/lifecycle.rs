//! LR record lifecycle.
//!
//! [`LrLifecycle`] owns the business rules around LR records: one live
//! record per `lrNum`, partial updates and delete confirmations. It talks
//! to storage only through [`RecordStore`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::coerce;
use crate::error::{Error, Result};
use crate::record::{DeletedRecord, LrRecord, KEY_FIELD};
use crate::storage::RecordStore;

/// Create, list, update and delete LR records.
#[derive(Debug, Clone)]
pub struct LrLifecycle {
    store: Arc<dyn RecordStore>,
}

impl LrLifecycle {
    /// Create a lifecycle manager over the given record store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create a new record from a client payload.
    ///
    /// The existence check and the insert are separate store calls; a
    /// concurrent create with the same key is caught by the store itself and
    /// reported the same way.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the payload is malformed or has no `lrNum`
    /// - [`Error::DuplicateRecord`] if a live record already holds the key
    pub async fn create(&self, payload: Value) -> Result<LrRecord> {
        let record = LrRecord::from_document(payload)?;
        let key = record.key()?.to_owned();

        if self.store.find_by_key(&key).await?.is_some() {
            debug!("Rejected create for existing LR {}", key);
            return Err(Error::DuplicateRecord);
        }

        let created = self.store.insert(record).await?;
        info!("Created LR {}", key);
        Ok(created)
    }

    /// List all records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<LrRecord>> {
        self.store.find_all().await
    }

    /// Apply a partial update to the record holding `lr_num`.
    ///
    /// # Errors
    ///
    /// - [`Error::RecordNotFound`] if no live record holds the key, checked
    ///   before the patch is looked at
    /// - [`Error::Validation`] if the patch is not an object, cannot be
    ///   coerced, or tries to change `lrNum`
    pub async fn update(&self, lr_num: &str, patch: Value) -> Result<LrRecord> {
        let Some(existing) = self.store.find_by_key(lr_num).await? else {
            debug!("Update for missing LR {}", lr_num);
            return Err(Error::RecordNotFound);
        };

        let Value::Object(patch) = patch else {
            return Err(Error::validation("update body must be a JSON object"));
        };

        if let Some(new_key) = patch.get(KEY_FIELD) {
            if coerce::as_text(new_key).as_deref() != Some(lr_num) {
                return Err(Error::validation(format!(
                    "{KEY_FIELD} cannot be changed by an update"
                )));
            }
        }

        let updated = self.store.update_in_place(&existing, &patch).await?;
        info!("Updated LR {}", lr_num);
        Ok(updated)
    }

    /// Delete the record holding `lr_num`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no live record holds the key.
    pub async fn delete(&self, lr_num: &str) -> Result<DeletedRecord> {
        match self.store.delete_by_key(lr_num).await? {
            Some(record) => {
                info!("Deleted LR {}", lr_num);
                Ok(DeletedRecord::new(record))
            }
            None => {
                debug!("Delete for missing LR {}", lr_num);
                Err(Error::RecordNotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteRecordStore, Storage};
    use async_trait::async_trait;
    use serde_json::{json, Map};

    fn create_test_lifecycle() -> LrLifecycle {
        let storage = Storage::open_in_memory().expect("failed to create test storage");
        LrLifecycle::new(Arc::new(SqliteRecordStore::new(storage)))
    }

    /// A store whose existence check always misses, as if a concurrent
    /// create slipped in between the check and the insert.
    #[derive(Debug)]
    struct BlindStore(SqliteRecordStore);

    #[async_trait]
    impl RecordStore for BlindStore {
        async fn find_all(&self) -> Result<Vec<LrRecord>> {
            self.0.find_all().await
        }

        async fn find_by_key(&self, _lr_num: &str) -> Result<Option<LrRecord>> {
            Ok(None)
        }

        async fn insert(&self, record: LrRecord) -> Result<LrRecord> {
            self.0.insert(record).await
        }

        async fn update_in_place(
            &self,
            existing: &LrRecord,
            patch: &Map<String, Value>,
        ) -> Result<LrRecord> {
            self.0.update_in_place(existing, patch).await
        }

        async fn delete_by_key(&self, lr_num: &str) -> Result<Option<LrRecord>> {
            self.0.delete_by_key(lr_num).await
        }
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let lifecycle = create_test_lifecycle();
        let created = lifecycle
            .create(json!({"lrNum": "LR100", "party": "Acme", "freight": 1200}))
            .await
            .unwrap();

        assert!(created.id.is_some());
        assert_eq!(created.freight.as_deref(), Some("1200"));

        let all = lifecycle.list().await.unwrap();
        assert_eq!(all, vec![created]);
    }

    #[tokio::test]
    async fn test_create_duplicate_leaves_existing_untouched() {
        let lifecycle = create_test_lifecycle();
        lifecycle
            .create(json!({"lrNum": "LR100", "party": "Acme"}))
            .await
            .unwrap();

        let err = lifecycle
            .create(json!({"lrNum": "LR100", "party": "Other"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord));
        assert_eq!(err.to_string(), "Already Record Exists With Same LR");

        let all = lifecycle.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].party.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_create_without_key_is_validation_error() {
        let lifecycle = create_test_lifecycle();
        for payload in [json!({"party": "Acme"}), json!({"lrNum": null}), json!({"lrNum": " "})] {
            let err = lifecycle.create(payload).await.unwrap_err();
            assert!(matches!(err, Error::Validation { .. }));
        }
        assert!(lifecycle.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_race_caught_by_store() {
        let storage = Storage::open_in_memory().unwrap();
        let lifecycle =
            LrLifecycle::new(Arc::new(BlindStore(SqliteRecordStore::new(storage))));

        lifecycle.create(json!({"lrNum": "LR1"})).await.unwrap();
        let err = lifecycle.create(json!({"lrNum": "LR1"})).await.unwrap_err();

        assert!(matches!(err, Error::DuplicateRecord));
        assert_eq!(lifecycle.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_is_partial_merge() {
        let lifecycle = create_test_lifecycle();
        let created = lifecycle
            .create(json!({
                "lrNum": "LR100",
                "lrDate": "2024-01-15",
                "party": "Acme",
                "freight": "100"
            }))
            .await
            .unwrap();

        let updated = lifecycle
            .update("LR100", json!({"freight": "250"}))
            .await
            .unwrap();

        assert_eq!(updated.freight.as_deref(), Some("250"));
        assert_eq!(
            LrRecord {
                freight: created.freight.clone(),
                ..updated.clone()
            },
            created
        );
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let lifecycle = create_test_lifecycle();
        let err = lifecycle
            .update("LR404", json!({"party": "X"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RecordNotFound));
    }

    #[tokio::test]
    async fn test_update_missing_record_wins_over_bad_patch() {
        let lifecycle = create_test_lifecycle();
        for patch in [json!({"lrNum": "LR405"}), json!([1]), json!({"lrNum": null})] {
            let err = lifecycle.update("LR404", patch).await.unwrap_err();
            assert!(matches!(err, Error::RecordNotFound));
        }
        assert!(lifecycle.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_key_change() {
        let lifecycle = create_test_lifecycle();
        lifecycle.create(json!({"lrNum": "LR1"})).await.unwrap();

        let err = lifecycle
            .update("LR1", json!({"lrNum": "LR2"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(lifecycle.update("LR2", json!({})).await.is_err());
        assert_eq!(lifecycle.list().await.unwrap()[0].lr_num.as_deref(), Some("LR1"));
    }

    #[tokio::test]
    async fn test_update_accepts_same_key() {
        let lifecycle = create_test_lifecycle();
        lifecycle.create(json!({"lrNum": "LR1"})).await.unwrap();

        let updated = lifecycle
            .update("LR1", json!({"lrNum": "LR1", "party": "NewCo"}))
            .await
            .unwrap();
        assert_eq!(updated.party.as_deref(), Some("NewCo"));
    }

    #[tokio::test]
    async fn test_update_rejects_non_object_patch() {
        let lifecycle = create_test_lifecycle();
        lifecycle.create(json!({"lrNum": "LR1"})).await.unwrap();

        let err = lifecycle.update("LR1", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_then_recreate() {
        let lifecycle = create_test_lifecycle();
        lifecycle
            .create(json!({"lrNum": "LR1", "party": "Acme"}))
            .await
            .unwrap();

        let deleted = lifecycle.delete("LR1").await.unwrap();
        assert_eq!(deleted.message, "Record deleted successfully");
        assert_eq!(deleted.deleted_record.party.as_deref(), Some("Acme"));

        let err = lifecycle.delete("LR1").await.unwrap_err();
        assert!(matches!(err, Error::RecordNotFound));

        lifecycle.create(json!({"lrNum": "LR1"})).await.unwrap();
    }
}
