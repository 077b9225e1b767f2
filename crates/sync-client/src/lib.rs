//! HTTP transport for the stockbook sync engine.

pub mod client;
pub mod error;

pub use client::SyncClient;
pub use error::{Result, SyncClientError};
