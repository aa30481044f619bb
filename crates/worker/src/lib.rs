//! Offline cache worker for a static site.
//!
//! Intercepts the site's own requests and serves them from versioned cache
//! stores so pages keep loading without a network:
//!
//! - HTML, CSS and JS: network-first, falling back to cache.
//! - Everything else: cache-first, falling back to network.
//!
//! See [`worker::OfflineWorker`] for the lifecycle and routing entry points.

pub mod background;
pub mod host;
pub mod lifecycle;
pub mod route;
pub mod worker;

#[cfg(test)]
mod testing;

pub use lifecycle::WorkerState;
pub use route::{RequestClass, Strategy};
pub use worker::{FetchOutcome, OfflineWorker};
