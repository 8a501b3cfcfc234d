//! Storage configuration.

use std::path::PathBuf;

/// Configuration for a role's on-disk store.
///
/// The store places its per-process directory under `base_dir`, falling back
/// to the operating system's temp directory when none is configured.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Base directory for the storage folder. `None` selects the OS temp
    /// directory.
    pub base_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Configuration with an explicit base directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Resolves the configured base directory.
    pub(crate) fn resolve_base(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
