//! Domain types, relationship validation and collaborator traits for the
//! zupu family register.
//!
//! No HTTP or database code lives here. The store traits in [`store`] are
//! implemented by `zupu-store-sqlite` on the server and by the HTTP client
//! in `zupu-cli`.

pub mod account;
pub mod audit;
pub mod describe;
pub mod error;
pub mod event;
pub mod family;
pub mod individual;
pub mod relationship;
pub mod session;
pub mod stats;
pub mod store;
pub mod tree;
pub mod validate;

pub use error::{Error, Result};
