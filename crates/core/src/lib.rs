//! Domain models and sync engine for the stockbook offline-first inventory app.

pub mod errors;
pub mod models;
pub mod sync;

pub use errors::{DatabaseError, Error, Result, RetryClass};
