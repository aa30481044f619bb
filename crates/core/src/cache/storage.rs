//! Store-level operations: open, list, delete, and lookup across stores.

use super::connection::CacheDb;
use super::store::{CacheStore, read_entry};
use crate::{Error, Request, Response};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

impl CacheDb {
    /// Open the store called `name`, creating it if absent.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("cache name cannot be empty".into()));
        }

        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let created = self
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(inserted == 1)
            })
            .await
            .map_err(Error::from)?;

        if created {
            tracing::debug!(store = name, "created cache store");
        }

        Ok(CacheStore::new(self.clone(), name.to_string()))
    }

    /// Handle to the store called `name` without creating it.
    ///
    /// Writes through the handle fail with `StoreNotFound` unless the store
    /// exists, so a late write cannot bring back a deleted generation.
    pub fn existing_store(&self, name: &str) -> CacheStore {
        CacheStore::new(self.clone(), name.to_string())
    }

    /// Names of every store, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a store exists without creating it.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns false if no such store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let owned = name.to_string();
        let deleted = self
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![owned])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)?;

        if deleted {
            tracing::debug!(store = name, "deleted cache store");
        }
        Ok(deleted)
    }

    /// Look `request` up in every store, oldest store first.
    ///
    /// Returns the first match, or None if no store holds the request.
    /// Non-GET requests never match.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_cacheable() {
            return Ok(None);
        }

        let key = request.cache_key();
        let entry = self
            .conn
            .call(move |conn| -> Result<Option<(u16, String, Vec<u8>)>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.headers_json, e.body
                         FROM cache_entries e
                         JOIN cache_stores s ON s.name = e.store
                         WHERE e.request_key = ?1
                         ORDER BY s.rowid ASC
                         LIMIT 1",
                        params![key],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        entry.map(read_entry).transpose()
    }
}
