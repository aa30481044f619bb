//! Database connection management with pragma configuration.
//!
//! Opening a database applies the pragmas the cache relies on (WAL for
//! concurrent readers, foreign keys so deleting a store cascades to its
//! entries) and runs pending migrations.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Handle to the cache storage database.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Cloning is cheap and every clone talks to the same
/// connection, so clones can be moved into background tasks.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        tracing::debug!(path = %path.display(), "opening cache database");
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    async fn configure(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}
