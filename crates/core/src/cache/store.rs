//! Entry operations on a single named store.

use super::connection::CacheDb;
use crate::{Error, Request, Response};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Handle to one named cache store.
///
/// Obtained from [`CacheDb::open_store`] or [`CacheDb::existing_store`]. The
/// handle stays usable after the store is deleted, but writes then fail with
/// `StoreNotFound` instead of resurrecting an orphaned generation.
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    name: String,
}

impl CacheStore {
    pub(crate) fn new(db: CacheDb, name: String) -> Self {
        Self { db, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `response` under `request`, replacing any previous entry.
    ///
    /// Only GET requests can be stored.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        if !request.is_cacheable() {
            return Err(Error::InvalidInput(format!("cannot cache {} request", request.method)));
        }

        let store = self.name.clone();
        let key = request.cache_key();
        let method = request.method.to_ascii_uppercase();
        let url = request.url.to_string();
        let status = response.status;
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let body = response.body.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let result = conn.execute(
                    "INSERT INTO cache_entries (
                        store, request_key, method, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(store, request_key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![&store, key, method, url, status, headers_json, &body[..], stored_at],
                );

                match result {
                    Ok(_) => Ok(()),
                    Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
                        Err(Error::StoreNotFound(store))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `request` in this store only. Non-GET requests never match.
    pub async fn get(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_cacheable() {
            return Ok(None);
        }

        let store = self.name.clone();
        let key = request.cache_key();
        let entry = self
            .db
            .conn
            .call(move |conn| -> Result<Option<(u16, String, Vec<u8>)>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, headers_json, body FROM cache_entries
                         WHERE store = ?1 AND request_key = ?2",
                        params![store, key],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        entry.map(read_entry).transpose()
    }

    /// Remove the entry for `request`. Returns false if there was none.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let store = self.name.clone();
        let key = request.cache_key();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE store = ?1 AND request_key = ?2",
                    params![store, key],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of every stored request, in insertion order.
    pub async fn urls(&self) -> Result<Vec<String>, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE store = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this store.
    pub async fn len(&self) -> Result<u64, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

/// Rebuild a response from its stored columns.
pub(crate) fn read_entry((status, headers_json, body): (u16, String, Vec<u8>)) -> Result<Response, Error> {
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    Ok(Response { status, headers, body: body.into() })
}
