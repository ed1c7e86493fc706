//! Generic item documents.
//!
//! Items are a minimal two-field collection with no invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::error::{Error, Result};

/// A stored item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Identifier assigned by the storage layer.
    #[serde(rename = "_id", skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// LR number the item refers to.
    #[serde(default, with = "coerce::text")]
    pub lr_no: Option<String>,
    /// LR date the item refers to.
    #[serde(default, with = "coerce::date")]
    pub lr_date: Option<DateTime<Utc>>,
}

impl Item {
    /// Build an item from an incoming JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the document is not an object or a
    /// field cannot be coerced.
    pub fn from_document(document: Value) -> Result<Self> {
        if !document.is_object() {
            return Err(Error::validation(
                "Item validation failed: document must be a JSON object",
            ));
        }
        serde_json::from_value(document)
            .map_err(|e| Error::validation(format!("Item validation failed: {e}")))
    }
}
