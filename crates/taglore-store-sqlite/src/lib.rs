//! SQLite backend for the taglore learning engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The single connection also serialises
//! reinforcement upserts to the same (keyword, code) pair, which is all the
//! mutual exclusion human-paced event rates need.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
