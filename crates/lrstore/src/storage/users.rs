//! User directory adapter.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};
use crate::user::User;

use super::Storage;

/// Storage for the user directory.
#[derive(Debug, Clone)]
pub struct UserStore {
    storage: Storage,
}

impl UserStore {
    /// Create an adapter over the given storage handle.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let id: i64 = row.get(0)?;
        let document: String = row.get(1)?;

        let mut user: User = serde_json::from_str(&document).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        user.id = Some(id);
        Ok(user)
    }

    /// List all users ordered by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<User>> {
        self.storage
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, document FROM users ORDER BY username")?;
                let users = stmt
                    .query_map([], Self::row_to_user)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(users)
            })
            .await
    }

    /// Find a user by exact username.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_owned();
        self.storage
            .call(move |conn| {
                let user = conn
                    .query_row(
                        "SELECT id, document FROM users WHERE username = ?1",
                        [&username],
                        Self::row_to_user,
                    )
                    .optional()?;
                Ok(user)
            })
            .await
    }

    /// Add a user to the directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank username and
    /// [`Error::DuplicateUser`] if the username is taken.
    pub async fn add(&self, user: User) -> Result<User> {
        if user.username.trim().is_empty() {
            return Err(Error::validation("username must not be empty"));
        }

        let username = user.username.clone();
        let document = serde_json::to_string(&user)?;

        let id = self
            .storage
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO users (username, document) VALUES (?1, ?2)",
                    params![username, document],
                );
                match inserted {
                    Ok(_) => Ok(conn.last_insert_rowid()),
                    Err(e) => {
                        let err = Error::from(e);
                        if err.is_unique_violation() {
                            Err(Error::DuplicateUser { username })
                        } else {
                            Err(err)
                        }
                    }
                }
            })
            .await?;

        debug!("Added user {} with id {}", user.username, id);
        Ok(User { id: Some(id), ..user })
    }
}
