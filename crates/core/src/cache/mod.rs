//! SQLite-backed storage for named, versioned cache stores.
//!
//! This module provides the persistent half of the offline worker: a set of
//! named stores, each mapping a request key to a buffered response. It
//! supports:
//!
//! - Lazy store creation on first open
//! - Listing and bulk deletion of stores (used to sweep old generations)
//! - Lookup across every store in creation order
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod names;
pub mod storage;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use names::CacheNames;
pub use store::CacheStore;
