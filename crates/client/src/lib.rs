//! Network side of sitecache.
//!
//! This crate provides the `Network` seam the worker fetches through, the
//! reqwest-backed `FetchClient` that implements it, and URL resolution
//! against the site origin.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, resolve};
