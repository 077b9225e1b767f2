//! Stable device identity capability.

use crate::errors::Result;

/// Supplies the per-device identifier attached to every push batch.
///
/// The identifier is generated once, persisted, and reused across pushes.
/// The server uses it for attribution and dedup; the engine itself never
/// relies on it for correctness. Injected explicitly into the engine rather
/// than fetched from ambient global state.
pub trait DeviceIdentityProvider: Send + Sync {
    fn device_id(&self) -> Result<String>;
}
