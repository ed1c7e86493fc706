//! Lading record types.
//!
//! An [`LrRecord`] is a shipment document keyed by its `lrNum`. Apart from
//! the key, every attribute is optional free-form text or a date, carried on
//! the wire as camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce;
use crate::error::{Error, Result};

/// Wire name of the key attribute.
pub const KEY_FIELD: &str = "lrNum";

/// A lading record.
///
/// Unknown attributes in incoming documents are discarded. The store-assigned
/// `_id` is emitted but never read from clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LrRecord {
    /// Identifier assigned by the storage layer.
    #[serde(rename = "_id", skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Business key, unique across live records.
    #[serde(default, with = "coerce::text")]
    pub lr_num: Option<String>,
    /// Date the LR was issued.
    #[serde(default, with = "coerce::date")]
    pub lr_date: Option<DateTime<Utc>>,
    /// Billing party.
    #[serde(default, with = "coerce::text")]
    pub party: Option<String>,
    /// Sender of the goods.
    #[serde(default, with = "coerce::text")]
    pub consignor: Option<String>,
    /// Consignor GST number.
    #[serde(default, with = "coerce::text")]
    pub consignor_gst: Option<String>,
    /// Receiver of the goods.
    #[serde(default, with = "coerce::text")]
    pub consignee: Option<String>,
    /// Consignee GST number.
    #[serde(default, with = "coerce::text")]
    pub consignee_gst: Option<String>,
    /// Origin station.
    #[serde(default, with = "coerce::text")]
    pub from_station: Option<String>,
    /// Destination station.
    #[serde(default, with = "coerce::text")]
    pub to_station: Option<String>,
    /// Vehicle registration number.
    #[serde(default, with = "coerce::text")]
    pub vehicle_num: Option<String>,
    /// Driver name.
    #[serde(default, with = "coerce::text")]
    pub driver_name: Option<String>,
    /// Driver contact number.
    #[serde(default, with = "coerce::text")]
    pub driver_mobile: Option<String>,
    /// Vehicle owner.
    #[serde(default, with = "coerce::text")]
    pub owner_name: Option<String>,
    /// Number of packages.
    #[serde(default, with = "coerce::text")]
    pub packages: Option<String>,
    /// Packing type (bags, cartons, loose).
    #[serde(default, with = "coerce::text")]
    pub packing_type: Option<String>,
    /// Description of goods.
    #[serde(default, with = "coerce::text")]
    pub description: Option<String>,
    /// Actual weight.
    #[serde(default, with = "coerce::text")]
    pub actual_weight: Option<String>,
    /// Weight the freight is charged on.
    #[serde(default, with = "coerce::text")]
    pub charged_weight: Option<String>,
    /// Freight rate.
    #[serde(default, with = "coerce::text")]
    pub rate: Option<String>,
    /// Freight amount.
    #[serde(default, with = "coerce::text")]
    pub freight: Option<String>,
    /// Advance paid.
    #[serde(default, with = "coerce::text")]
    pub advance: Option<String>,
    /// Balance due.
    #[serde(default, with = "coerce::text")]
    pub balance: Option<String>,
    /// Loading and unloading charges.
    #[serde(default, with = "coerce::text")]
    pub hamali: Option<String>,
    /// Any other charges.
    #[serde(default, with = "coerce::text")]
    pub other_charges: Option<String>,
    /// Total amount.
    #[serde(default, with = "coerce::text")]
    pub total_amount: Option<String>,
    /// Commission amount.
    #[serde(default, with = "coerce::text")]
    pub commission: Option<String>,
    /// Commission percentage.
    #[serde(default, with = "coerce::text")]
    pub commission_percent: Option<String>,
    /// TDS amount.
    #[serde(default, with = "coerce::text")]
    pub tds: Option<String>,
    /// TDS percentage.
    #[serde(default, with = "coerce::text")]
    pub tds_percent: Option<String>,
    /// Payment mode (paid, to pay, TBB).
    #[serde(default, with = "coerce::text")]
    pub payment_mode: Option<String>,
    /// Bill number.
    #[serde(default, with = "coerce::text")]
    pub bill_num: Option<String>,
    /// Bill date.
    #[serde(default, with = "coerce::date")]
    pub bill_date: Option<DateTime<Utc>>,
    /// Consignor invoice number.
    #[serde(default, with = "coerce::text")]
    pub invoice_num: Option<String>,
    /// Consignor invoice date.
    #[serde(default, with = "coerce::date")]
    pub invoice_date: Option<DateTime<Utc>>,
    /// Date the goods were delivered.
    #[serde(default, with = "coerce::date")]
    pub delivery_date: Option<DateTime<Utc>>,
    /// Whether proof of delivery was received.
    #[serde(default, with = "coerce::text")]
    pub pod_received: Option<String>,
    /// Date proof of delivery was received.
    #[serde(default, with = "coerce::date")]
    pub pod_date: Option<DateTime<Utc>>,
    /// Free-form remarks.
    #[serde(default, with = "coerce::text")]
    pub remarks: Option<String>,
}

/// Response body for a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRecord {
    /// Confirmation message.
    pub message: String,
    /// The record as it was before deletion.
    pub deleted_record: LrRecord,
}

impl DeletedRecord {
    /// Wrap a deleted record with the standard confirmation message.
    #[must_use]
    pub fn new(deleted_record: LrRecord) -> Self {
        Self {
            message: "Record deleted successfully".to_string(),
            deleted_record,
        }
    }
}

impl LrRecord {
    /// Build a record from an incoming JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the document is not an object or a
    /// field cannot be coerced to its type.
    pub fn from_document(document: Value) -> Result<Self> {
        if !document.is_object() {
            return Err(Error::validation(
                "LR validation failed: document must be a JSON object",
            ));
        }
        serde_json::from_value(document)
            .map_err(|e| Error::validation(format!("LR validation failed: {e}")))
    }

    /// Get the business key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `lrNum` is missing, null or blank.
    pub fn key(&self) -> Result<&str> {
        self.lr_num
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::validation("LR validation failed: lrNum: Path `lrNum` is required."))
    }

    /// Apply a shallow patch, returning the merged record.
    ///
    /// Fields present in `patch` overwrite the existing values, including
    /// with `null`. Fields absent from `patch` are preserved as they are.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a patched field cannot be coerced.
    pub fn merged_with(&self, patch: &Map<String, Value>) -> Result<Self> {
        let mut document = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(Error::internal("record did not serialize to an object")),
        };
        for (field, value) in patch {
            document.insert(field.clone(), value.clone());
        }

        let mut merged = Self::from_document(Value::Object(document))?;
        merged.id = self.id;
        Ok(merged)
    }

    /// Serialize the record for storage, without the store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_document(&self) -> Result<String> {
        let stored = Self {
            id: None,
            ..self.clone()
        };
        Ok(serde_json::to_string(&stored)?)
    }
}
