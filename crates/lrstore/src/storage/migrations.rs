//! Schema versioning.
//!
//! The schema version lives in the `metadata` table. Each entry of
//! [`MIGRATIONS`] moves the schema forward by exactly one version and is
//! applied in its own transaction, so a failed step leaves the database at
//! the previous version.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{Error, Result};

use super::schema;

/// Ordered migrations. Entry `n` produces schema version `n + 1`.
const MIGRATIONS: &[&[&str]] = &[schema::V1];

/// The schema version this build reads and writes.
pub const CURRENT_VERSION: usize = MIGRATIONS.len();

const VERSION_KEY: &str = "schema_version";

/// Bring the database schema up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if a migration fails, the stored version is unreadable,
/// or the database was written by a newer lrstore.
pub fn initialize_schema(conn: &mut Connection) -> Result<()> {
    conn.execute(schema::CREATE_METADATA_TABLE, [])?;

    let version = stored_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for (index, statements) in MIGRATIONS.iter().enumerate().skip(version) {
        let target = index + 1;
        let tx = conn.transaction()?;
        for statement in *statements {
            tx.execute(statement, [])?;
        }
        write_version(&tx, target)?;
        tx.commit()?;
        info!("Migrated database schema to version {}", target);
    }

    Ok(())
}

/// Read the stored schema version; a database without one is at version 0.
fn stored_version(conn: &Connection) -> Result<usize> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("unreadable schema version: {value}"),
        }),
    }
}

fn write_version(conn: &Connection, version: usize) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO metadata (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        ",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize_schema(&mut conn).unwrap();
        conn
    }

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<String>, _>>()
            .unwrap();
        names
    }

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let conn = migrated_db();

        let tables = table_names(&conn);
        for table in ["items", "lr_records", "metadata", "users"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
        assert_eq!(stored_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_migrating_twice_is_a_no_op() {
        let mut conn = migrated_db();
        conn.execute("INSERT INTO items (document) VALUES ('{}')", [])
            .unwrap();

        initialize_schema(&mut conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(stored_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_newer_database_is_refused() {
        let mut conn = migrated_db();
        write_version(&conn, CURRENT_VERSION + 1).unwrap();

        let err = initialize_schema(&mut conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_missing_version_reads_as_zero() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(schema::CREATE_METADATA_TABLE, []).unwrap();
        assert_eq!(stored_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_garbage_version_is_an_error() {
        let conn = migrated_db();
        conn.execute(
            "UPDATE metadata SET value = 'one' WHERE key = ?1",
            [VERSION_KEY],
        )
        .unwrap();

        let err = stored_version(&conn).unwrap_err();
        assert!(err.to_string().contains("unreadable schema version"));
    }

    #[test]
    fn test_lr_num_index_is_unique() {
        let conn = migrated_db();
        let unique: i32 = conn
            .query_row(
                "SELECT \"unique\" FROM pragma_index_list('lr_records') WHERE name = 'idx_lr_records_lr_num'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(unique, 1);
    }
}
