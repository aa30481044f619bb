//! Core types and shared functionality for sitecache.
//!
//! This crate provides:
//! - Named, versioned cache stores with a SQLite backend
//! - Request/response types shared by the network and worker layers
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{CacheDb, CacheNames, CacheStore};
pub use config::{AppConfig, ConfigError, WorkerConfig};
pub use error::Error;
pub use message::{Request, RequestMode, Response};
