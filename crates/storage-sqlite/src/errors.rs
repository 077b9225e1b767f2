//! Storage error newtype mapping diesel/pool failures into the core taxonomy.

use thiserror::Error;

use stockbook_core::{DatabaseError, Error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error(transparent)]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Diesel(e) => Error::Database(DatabaseError::Query(e.to_string())),
            StorageError::Pool(e) => Error::Database(DatabaseError::Pool(e.to_string())),
            StorageError::Connection(e) => Error::Database(DatabaseError::Pool(e.to_string())),
            StorageError::Migration(e) => Error::Database(DatabaseError::Migration(e)),
        }
    }
}
