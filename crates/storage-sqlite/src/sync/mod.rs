//! SQLite-backed sync: identity resolution, device identity and the store
//! consumed by the core engine.

pub mod device;
pub mod identity;
pub mod model;
pub mod store;

pub use device::SqliteDeviceIdentity;
pub use store::SqliteSyncStore;
