//! Configuration types for the DEPOT node daemon.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main configuration for the DEPOT node daemon.
///
/// Loaded from a TOML file; a default file is written when none exists yet.
///
/// # Example
///
/// ```
/// use depot_node::config::NodeConfig;
///
/// let config = NodeConfig::default();
/// assert_eq!(config.node.port, 6124);
/// assert_eq!(config.node.bind, "0.0.0.0");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Listener settings.
    pub node: NodeSettings,
    /// Blob storage settings.
    pub storage: StorageSettings,
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    /// IP address to bind the blob server to.
    pub bind: String,
    /// Port the blob server listens on.
    pub port: u16,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: depot_service::DEFAULT_PORT,
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Base directory for the per-process storage folder. The OS temp
    /// directory is used when unset.
    pub directory: Option<PathBuf>,
}

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl NodeConfig {
    /// Loads the configuration from `path`, writing (and returning) the
    /// defaults when the file does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            return toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            });
        }

        let config = Self::default();
        let rendered =
            toml::to_string_pretty(&config).expect("default config must serialize");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, rendered).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_values() {
        let config = NodeConfig::default();

        assert_eq!(config.node.bind, "0.0.0.0");
        assert_eq!(config.node.port, 6124);
        assert!(config.storage.directory.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = NodeConfig::default();
        config.node.port = 7000;
        config.storage.directory = Some(PathBuf::from("/var/lib/depot"));

        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: NodeConfig = toml::from_str(&rendered).unwrap();

        assert_eq!(parsed.node.port, 7000);
        assert_eq!(
            parsed.storage.directory.as_deref(),
            Some(Path::new("/var/lib/depot"))
        );
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let created = NodeConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.node.port, 6124);

        // A second load reads the file it just wrote.
        let loaded = NodeConfig::load_or_create(&path).unwrap();
        assert_eq!(loaded.node.bind, created.node.bind);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a table\"").unwrap();

        assert!(matches!(
            NodeConfig::load_or_create(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
