//! Item collection adapter.

use rusqlite::params;
use tracing::debug;

use crate::error::Result;
use crate::item::Item;

use super::Storage;

/// Storage for generic items.
#[derive(Debug, Clone)]
pub struct ItemStore {
    storage: Storage,
}

impl ItemStore {
    /// Create an adapter over the given storage handle.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Persist a new item and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails.
    pub async fn create(&self, item: Item) -> Result<Item> {
        let document = serde_json::to_string(&Item {
            id: None,
            ..item.clone()
        })?;

        let id = self
            .storage
            .call(move |conn| {
                conn.execute("INSERT INTO items (document) VALUES (?1)", params![document])?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!("Inserted item with id {}", id);
        Ok(Item { id: Some(id), ..item })
    }

    /// List every item in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored document is corrupt.
    pub async fn list(&self) -> Result<Vec<Item>> {
        self.storage
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id, document FROM items ORDER BY id")?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(id, document)| -> Result<Item> {
                        let mut item: Item = serde_json::from_str(&document)?;
                        item.id = Some(id);
                        Ok(item)
                    })
                    .collect()
            })
            .await
    }
}
