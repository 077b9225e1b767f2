//! Database bootstrap: pool, migrations and additive schema evolution.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

use stockbook_core::{DatabaseError, Error, Result};

use crate::errors::StorageError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Tables that carry sync metadata columns.
const SYNC_TRACKED_TABLES: [&str; 2] = ["products", "invoices"];

#[derive(Debug)]
struct ConnectionOptions;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Ensure the app data directory exists and return the database file path.
pub fn init(app_data_dir: &str) -> Result<String> {
    let dir = Path::new(app_data_dir);
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::Database(DatabaseError::Internal(format!(
                "Failed to create app data dir: {}",
                e
            )))
        })?;
    }
    Ok(dir.join("stockbook.db").to_string_lossy().to_string())
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))?;
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &Arc<DbPool>) -> Result<DbConnection> {
    pool.get().map_err(StorageError::from).map_err(Error::from)
}

/// Run embedded migrations, then apply additive sync-column evolution.
pub fn run_migrations(db_path: &str) -> Result<()> {
    let mut conn = SqliteConnection::establish(db_path).map_err(StorageError::from)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    if !applied.is_empty() {
        info!("Applied {} migrations", applied.len());
    }
    ensure_sync_columns(&mut conn)?;
    Ok(())
}

#[derive(diesel::QueryableByName)]
struct PragmaTableInfoRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}

fn load_table_columns(conn: &mut SqliteConnection, table_name: &str) -> Result<Vec<String>> {
    let sql = format!(
        "PRAGMA table_info('{}')",
        table_name.replace('\'', "''")
    );
    let columns = diesel::sql_query(sql)
        .load::<PragmaTableInfoRow>(conn)
        .map_err(StorageError::from)?
        .into_iter()
        .map(|row| row.name)
        .collect();
    Ok(columns)
}

/// Add `server_id` / `synced_at` to sync-tracked tables when missing.
///
/// Checks schema metadata first instead of attempting the ALTER and
/// swallowing "duplicate column" errors, so reruns are true no-ops.
pub fn ensure_sync_columns(conn: &mut SqliteConnection) -> Result<()> {
    for table in SYNC_TRACKED_TABLES {
        let columns = load_table_columns(conn, table)?;
        for column in ["server_id", "synced_at"] {
            if columns.iter().any(|c| c == column) {
                continue;
            }
            debug!("Adding column {}.{}", table, column);
            let sql = format!("ALTER TABLE {} ADD COLUMN {} TEXT", table, column);
            diesel::sql_query(sql)
                .execute(conn)
                .map_err(StorageError::from)?;
        }

        // At most one local row may map to a given server id.
        let index_sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_server_id \
             ON {table} (server_id) WHERE server_id IS NOT NULL"
        );
        diesel::sql_query(index_sql)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fresh_db() -> String {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        init(&app_data).expect("init db")
    }

    #[test]
    fn migrations_and_sync_columns_are_idempotent() {
        let db_path = fresh_db();
        run_migrations(&db_path).expect("first run");
        run_migrations(&db_path).expect("second run is a no-op");

        let mut conn = SqliteConnection::establish(&db_path).expect("connect");
        for table in SYNC_TRACKED_TABLES {
            let columns = load_table_columns(&mut conn, table).expect("columns");
            assert!(columns.iter().any(|c| c == "server_id"), "{table} server_id");
            assert!(columns.iter().any(|c| c == "synced_at"), "{table} synced_at");
            let occurrences = columns.iter().filter(|c| *c == "server_id").count();
            assert_eq!(occurrences, 1, "{table} must not duplicate columns");
        }
    }

    #[test]
    fn server_id_uniqueness_is_enforced_for_non_null_values() {
        let db_path = fresh_db();
        run_migrations(&db_path).expect("migrate");
        let mut conn = SqliteConnection::establish(&db_path).expect("connect");

        let insert = |conn: &mut SqliteConnection, name: &str, server_id: &str| {
            diesel::sql_query(format!(
                "INSERT INTO products (name, created_at, server_id) VALUES ('{}', '2026-02-01T08:00:00+00:00', '{}')",
                name, server_id
            ))
            .execute(conn)
        };

        insert(&mut conn, "Rice", "srv_1").expect("first insert");
        assert!(insert(&mut conn, "Beans", "srv_1").is_err(), "duplicate server id");

        // NULL server ids are exempt from the partial index.
        for name in ["Salt", "Sugar"] {
            diesel::sql_query(format!(
                "INSERT INTO products (name, created_at) VALUES ('{}', '2026-02-01T08:00:00+00:00')",
                name
            ))
            .execute(&mut conn)
            .expect("unsynced rows");
        }
    }
}
