//! Database Module - SQLite driver
//!
//! # Module Structure
//! - `core`: SqliteDriver struct, connect/close, timed statement execution
//! - `transaction`: begin/commit/rollback and scoped connections
//! - `table`: table creation (with full-text shadow tables)
//! - `crud`: add/update/remove, find/count/search, raw statements

pub mod core;
pub mod crud;
pub mod table;
pub mod transaction;

pub use self::core::SqliteDriver;
pub use crud::QueryResponse;
