//! Best-effort cache writes that run after the response has been served.
//!
//! A write is spawned as a tokio task and never awaited by the fetch that
//! caused it. Failures (store deleted mid-flight, disk full, ...) are logged
//! and dropped; they never change what the page received.

use sitecache_core::{CacheStore, Request, Response};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Tracks in-flight background writes so the host can wait for them.
#[derive(Debug, Default)]
pub struct BackgroundWrites {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `response` under `request` in `store`. Returns immediately.
    ///
    /// The store is never created here; a write to a store that has since
    /// been deleted fails and is dropped.
    pub async fn put(&self, store: CacheStore, request: Request, response: Response) {
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            let url = request.url.to_string();
            match store.put(&request, &response).await {
                Ok(()) => tracing::debug!(store = store.name(), %url, "cached response"),
                Err(e) => tracing::warn!(store = store.name(), %url, error = %e, "background cache write failed"),
            }
        });
    }

    /// Number of writes spawned but not yet reaped.
    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Wait for every outstanding write. Returns how many were awaited.
    pub async fn settle(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().await);
        let mut settled = 0;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "background cache write task panicked");
            }
            settled += 1;
        }
        settled
    }
}
