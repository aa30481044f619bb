//! Versioned cache store names.

use std::fmt;

/// The pair of store names that make up one cache generation.
///
/// Names follow `<app>-static-<version>` and `<app>-runtime-<version>`.
/// Bumping the version yields a new generation; stores of any other
/// generation are orphans and get swept at activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    static_name: String,
    runtime_name: String,
}

impl CacheNames {
    pub fn new(app: &str, version: &str) -> Self {
        Self { static_name: format!("{app}-static-{version}"), runtime_name: format!("{app}-runtime-{version}") }
    }

    /// Name of the store holding the precached assets.
    pub fn static_name(&self) -> &str {
        &self.static_name
    }

    /// Name of the store holding responses cached while serving.
    pub fn runtime_name(&self) -> &str {
        &self.runtime_name
    }

    /// Whether `name` belongs to this generation.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_name || name == self.runtime_name
    }
}

impl fmt::Display for CacheNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.static_name, self.runtime_name)
    }
}
