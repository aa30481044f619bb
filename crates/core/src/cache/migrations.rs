//! Database schema migrations.
//!
//! A `_migrations` table records every applied version. Pending migrations
//! run in order, each inside its own transaction together with its
//! version row.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Migration list: (version, SQL). Versions must be strictly increasing.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_cache_storage.sql"))];

/// Highest schema version this build knows about.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|(v, _)| *v).unwrap_or(0)
}

/// Run any pending migrations.
///
/// # Errors
///
/// Returns `MigrationFailed` if the database was written by a newer build,
/// or a database error if a migration SQL fails to execute.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        if current > latest_version() {
            return Err(Error::MigrationFailed(format!(
                "database schema v{current} is newer than supported v{}",
                latest_version()
            )));
        }

        for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version, "applied cache schema migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let tables: i64 = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master
                     WHERE type='table' AND name IN ('cache_stores', 'cache_entries')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();

        assert_eq!(tables, 2);
    }

    #[tokio::test]
    async fn test_migrations_version_tracking() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let max: i64 = conn
            .call(|conn| conn.query_row("SELECT MAX(version) FROM _migrations", [], |row| row.get(0)))
            .await
            .unwrap();

        assert_eq!(max, latest_version());
    }

    #[tokio::test]
    async fn test_rejects_newer_schema() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        conn.call(|conn| {
            conn.execute("INSERT INTO _migrations (version, applied_at) VALUES (99, 'later')", [])
        })
        .await
        .unwrap();

        let result = run(&conn).await;
        assert!(matches!(result, Err(Error::MigrationFailed(_))));
    }
}
