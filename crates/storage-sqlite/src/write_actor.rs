//! Serialized write access to the database.
//!
//! A dedicated thread owns write execution; every job runs inside one
//! `immediate_transaction`, which is the scoped-transaction primitive the
//! reconcilers rely on: a mid-batch failure rolls the whole phase back.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::warn;
use tokio::sync::{mpsc, oneshot};

use stockbook_core::{DatabaseError, Error, Result};

use crate::errors::StorageError;

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send>;

/// Transaction error carrier: either the job's own error or a diesel
/// failure raised by the transaction machinery itself.
enum TxError {
    App(Error),
    Db(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Db(err)
    }
}

/// Handle for queueing transactional write jobs.
#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<WriteJob>,
}

impl WriteHandle {
    /// Run `job` inside one immediate transaction on the writer thread.
    pub async fn exec<R, F>(&self, job: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<R> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let wrapped: WriteJob = Box::new(move |conn| {
            let result = conn
                .immediate_transaction(|tx| job(tx).map_err(TxError::App))
                .map_err(|err| match err {
                    TxError::App(app) => app,
                    TxError::Db(db) => Error::from(StorageError::from(db)),
                });
            let _ = reply_tx.send(result);
        });

        self.sender.send(wrapped).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Database writer is shut down".to_string(),
            ))
        })?;
        reply_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Database writer dropped the reply".to_string(),
            ))
        })?
    }
}

/// Spawn the writer thread. Jobs are executed strictly in submission order.
pub fn spawn_writer(pool: Pool<ConnectionManager<SqliteConnection>>) -> WriteHandle {
    let (sender, mut receiver) = mpsc::unbounded_channel::<WriteJob>();

    std::thread::Builder::new()
        .name("db-writer".to_string())
        .spawn(move || {
            while let Some(job) = receiver.blocking_recv() {
                match pool.get() {
                    Ok(mut conn) => job(&mut conn),
                    Err(err) => {
                        // The job's reply channel is dropped with it; the
                        // caller observes a writer error.
                        warn!("Writer could not acquire a connection: {}", err);
                    }
                }
            }
        })
        .expect("Failed to spawn database writer thread");

    WriteHandle { sender }
}
