//! `lrstore` - Lading record management backend
//!
//! This library provides the storage, business rules and HTTP API for
//! lading records (LRs), keyed by their unique `lrNum`, along with a small
//! item collection and a user directory.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod error;
pub mod item;
pub mod lifecycle;
pub mod logging;
pub mod record;
pub mod server;
pub mod storage;
pub mod user;

pub use config::Config;
pub use error::{Error, Result};
pub use item::Item;
pub use lifecycle::LrLifecycle;
pub use logging::init_logging;
pub use record::{DeletedRecord, LrRecord};
pub use server::Server;
pub use storage::{Storage, StorageStats};
pub use user::User;
