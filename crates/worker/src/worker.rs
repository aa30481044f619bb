//! The offline cache worker.
//!
//! One `OfflineWorker` is one cache generation. The host drives it through
//! `install` and `activate` (or `start` for both), then hands every page
//! request to `handle_fetch`:
//!
//! - Requests for other origins, or arriving before activation, pass through.
//! - HTML, CSS and JS are served network-first with a cache fallback.
//! - Everything else is served cache-first.
//!
//! Successful network responses are written to the runtime cache in the
//! background; the page never waits for the write.

use std::sync::Arc;

use sitecache_client::{Network, resolve};
use sitecache_core::{CacheDb, CacheNames, Error, Request, Response, WorkerConfig};
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use crate::background::BackgroundWrites;
use crate::lifecycle::WorkerState;
use crate::route::{RequestClass, Strategy, is_same_origin};

/// What the worker did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself.
    PassThrough,
    /// Served from a fresh network response.
    Network(Response),
    /// Served from a cache store.
    Cache(Response),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::PassThrough => None,
            FetchOutcome::Network(r) | FetchOutcome::Cache(r) => Some(r),
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            FetchOutcome::PassThrough => None,
            FetchOutcome::Network(r) | FetchOutcome::Cache(r) => Some(r),
        }
    }

    /// Short label for logs and host output.
    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::PassThrough => "passthrough",
            FetchOutcome::Network(_) => "network",
            FetchOutcome::Cache(_) => "cache",
        }
    }
}

/// Offline cache worker over a cache database and a network.
pub struct OfflineWorker {
    config: WorkerConfig,
    db: CacheDb,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
    writes: BackgroundWrites,
}

impl OfflineWorker {
    pub fn new(config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { config, db, network, state: RwLock::new(WorkerState::Parsed), writes: BackgroundWrites::new() }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn cache_names(&self) -> &CacheNames {
        &self.config.names
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Install and, without waiting for existing clients, activate.
    pub async fn start(&self) -> Result<(), Error> {
        self.install().await?;
        self.activate().await?;
        Ok(())
    }

    /// Precache the static asset list into the static store.
    ///
    /// All assets are fetched before any is written. If one fetch fails or
    /// returns a non-2xx status, nothing is written, the worker becomes
    /// redundant, and calling `install` again retries from scratch.
    pub async fn install(&self) -> Result<(), Error> {
        self.begin("install", WorkerState::can_install, WorkerState::Installing)
            .await?;

        match self.precache().await {
            Ok(count) => {
                self.set_state(WorkerState::Installed).await;
                tracing::info!(store = self.config.names.static_name(), assets = count, "worker installed");
                Ok(())
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::warn!(error = %e, "worker install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let store = self.db.open_store(self.config.names.static_name()).await?;

        let requests = self
            .config
            .precache
            .iter()
            .map(|asset| {
                resolve(&self.config.origin, asset)
                    .map(Request::get)
                    .map_err(|e| Error::InstallFailed(format!("{asset}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut join_set = JoinSet::new();
        for (index, request) in requests.into_iter().enumerate() {
            let network = Arc::clone(&self.network);
            join_set.spawn(async move {
                let result = network.fetch(&request).await;
                (index, request, result)
            });
        }

        let mut fetched = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            let (index, request, result) = joined.map_err(|e| Error::InstallFailed(e.to_string()))?;
            let failure = match result {
                Ok(response) if response.ok() => {
                    fetched.push((index, request, response));
                    continue;
                }
                Ok(response) => format!("{} returned status {}", request.url, response.status),
                Err(e) => format!("{}: {}", request.url, e),
            };
            join_set.shutdown().await;
            return Err(Error::InstallFailed(failure));
        }

        fetched.sort_by_key(|(index, _, _)| *index);
        for (_, request, response) in &fetched {
            store.put(request, response).await?;
        }

        Ok(fetched.len())
    }

    /// Delete every store outside the current generation, create the runtime
    /// store, then take control.
    ///
    /// Returns the names of the deleted stores.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.begin("activate", WorkerState::can_activate, WorkerState::Activating)
            .await?;

        match self.sweep_orphans().await {
            Ok(deleted) => {
                self.set_state(WorkerState::Activated).await;
                tracing::info!(caches = %self.config.names, purged = deleted.len(), "worker activated, clients claimed");
                Ok(deleted)
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::warn!(error = %e, "worker activation failed");
                Err(e)
            }
        }
    }

    async fn sweep_orphans(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.db.store_names().await? {
            if self.config.names.is_current(&name) {
                continue;
            }
            self.db.delete_store(&name).await?;
            tracing::info!(store = %name, "deleted orphaned cache generation");
            deleted.push(name);
        }
        self.db.open_store(self.config.names.runtime_name()).await?;
        Ok(deleted)
    }

    /// Route one intercepted request.
    ///
    /// Resolves once the response to serve is fully buffered. Cache writes
    /// triggered by the request may still be running; see [`Self::settle`].
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let state = self.state().await;
        if !state.can_intercept_fetch() {
            tracing::debug!(url = %request.url, %state, "worker not active, passing through");
            return Ok(FetchOutcome::PassThrough);
        }

        if !is_same_origin(&request.url, &self.config.origin) {
            tracing::debug!(url = %request.url, "cross-origin request, passing through");
            return Ok(FetchOutcome::PassThrough);
        }

        let class = RequestClass::classify(request);
        tracing::debug!(url = %request.url, ?class, "intercepted fetch");

        match class.strategy() {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &Request) -> Result<FetchOutcome, Error> {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.cache_in_background(request, &response).await;
                Ok(FetchOutcome::Network(response))
            }
            Err(cause) => {
                tracing::debug!(url = %request.url, error = %cause, "network failed, trying cache");
                match self.db.match_request(request).await? {
                    Some(cached) => Ok(FetchOutcome::Cache(cached)),
                    None => Err(Error::Unavailable { url: request.url.to_string(), cause: cause.to_string() }),
                }
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if let Some(cached) = self.db.match_request(request).await? {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(FetchOutcome::Cache(cached));
        }

        let response = self.network.fetch(request).await?;
        self.cache_in_background(request, &response).await;
        Ok(FetchOutcome::Network(response))
    }

    async fn cache_in_background(&self, request: &Request, response: &Response) {
        if !request.is_cacheable() {
            tracing::debug!(url = %request.url, method = %request.method, "not caching non-GET request");
            return;
        }
        // Partial content is never cacheable.
        if response.status == 206 {
            tracing::debug!(url = %request.url, "not caching partial response");
            return;
        }

        let runtime = self.db.existing_store(self.config.names.runtime_name());
        self.writes
            .put(runtime, request.clone(), response.clone())
            .await;
    }

    /// Wait for every background cache write to finish.
    pub async fn settle(&self) -> usize {
        self.writes.settle().await
    }

    async fn begin(
        &self, operation: &'static str, allowed: fn(&WorkerState) -> bool, next: WorkerState,
    ) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !allowed(&state) {
            return Err(Error::InvalidState { operation, state: (*state).to_string() });
        }
        tracing::debug!(from = %*state, to = %next, "worker state change");
        *state = next;
        Ok(())
    }

    async fn set_state(&self, next: WorkerState) {
        *self.state.write().await = next;
    }
}
