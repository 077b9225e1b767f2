//! SQLite persistence for the stockbook domain.
//!
//! Reads go straight through the r2d2 pool; all writes are funneled through
//! a single writer thread so every mutation runs inside one immediate
//! transaction. Sync metadata columns are evolved additively at startup,
//! keeping databases created before sync support usable in place.

pub mod db;
pub mod errors;
pub mod invoices;
pub mod products;
pub mod schema;
pub mod sync;
pub mod write_actor;

pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool};
pub use errors::StorageError;
pub use invoices::InvoiceRepository;
pub use products::ProductRepository;
pub use sync::{SqliteDeviceIdentity, SqliteSyncStore};
pub use write_actor::{spawn_writer, WriteHandle};
