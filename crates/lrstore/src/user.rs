//! User directory entries.
//!
//! Users are looked up over HTTP and provisioned from the CLI.

use serde::{Deserialize, Serialize};

/// A user in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier assigned by the storage layer.
    #[serde(rename = "_id", skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Unique login name.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Mobile number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    /// Role within the office (e.g. "booking", "accounts").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    /// Create a new user with only the required fields set.
    #[must_use]
    pub fn new(username: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            name: name.into(),
            email: None,
            mobile: None,
            role: None,
        }
    }
}
