//! `SQLite` schema definitions for lrstore.
//!
//! Each collection is a table holding JSON documents. Columns outside the
//! document exist only where the store has to enforce or look up something.

/// SQL statement to create the LR records table.
pub const CREATE_LR_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS lr_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lr_num TEXT NOT NULL,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the unique index on `lr_num`.
///
/// This is the authoritative uniqueness guarantee for LR records.
pub const CREATE_LR_NUM_UNIQUE_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_lr_records_lr_num ON lr_records(lr_num)
";

/// SQL statement to create the items table.
pub const CREATE_ITEMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the users table.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Key-value table holding the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Statements producing schema version 1.
///
/// The metadata table is created ahead of any migration and is not listed.
pub const V1: &[&str] = &[
    CREATE_LR_RECORDS_TABLE,
    CREATE_LR_NUM_UNIQUE_INDEX,
    CREATE_ITEMS_TABLE,
    CREATE_USERS_TABLE,
];
