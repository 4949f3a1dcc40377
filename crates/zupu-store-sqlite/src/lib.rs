//! SQLite backend for the zupu family register.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] implements all
//! three collaborator traits of `zupu-core`.

mod audit;
mod encode;
mod identity;
mod schema;
mod store;
mod token;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
