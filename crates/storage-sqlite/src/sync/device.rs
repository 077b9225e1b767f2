//! SQLite-backed stable device identity.

use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use stockbook_core::sync::DeviceIdentityProvider;
use stockbook_core::Result;

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::device_config;
use crate::sync::model::DeviceConfigDB;

/// Generates a UUID once, persists it in `device_config` and returns the
/// same value on every subsequent call.
pub struct SqliteDeviceIdentity {
    pool: Arc<DbPool>,
}

impl SqliteDeviceIdentity {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl DeviceIdentityProvider for SqliteDeviceIdentity {
    fn device_id(&self) -> Result<String> {
        let mut conn = get_connection(&self.pool)?;
        let existing = device_config::table
            .select(device_config::device_id)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        if let Some(device_id) = existing {
            return Ok(device_id);
        }

        let row = DeviceConfigDB {
            device_id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        diesel::insert_into(device_config::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(StorageError::from)?;
        Ok(row.device_id)
    }
}
