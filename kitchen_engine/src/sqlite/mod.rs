//! SQLite backend for the kitchen engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
