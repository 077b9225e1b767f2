//! Read-only engine status surfaced to callers.

use serde::{Deserialize, Serialize};

/// Lightweight sync engine status persisted by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngineStatus {
    pub last_pull_at: Option<String>,
    pub last_push_at: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: i32,
}
