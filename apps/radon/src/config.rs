//! # Configuration
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config <path>`, or `radon.toml` in the working
//!    directory when present
//! 3. Environment: `RADON_DB`, `RADON_BACKEND`, `RADON_OPERATOR`,
//!    `RADON_STOCK_BASELINE`, `RADON_HOST`, `RADON_PORT`
//!
//! Command-line flags are applied on top by the CLI.
//!
//! ```toml
//! database = "data/radon.json"
//! backend = "json"
//! operator = "Mario Rossi"
//! stock_baseline = 250
//! host = "127.0.0.1"
//! port = 8080
//! ```

use radon_core::primitives::DEFAULT_STOCK_BASELINE;
use radon_core::{BackendKind, CampaignRegistry, RadonError, StorageBackend};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File picked up automatically when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "radon.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RadonConfig {
    pub database: PathBuf,
    /// `json`, `redb` or `memory`.
    pub backend: String,
    /// Name recorded on stock ledger entries.
    pub operator: String,
    pub stock_baseline: u32,
    pub host: String,
    pub port: u16,
}

impl Default for RadonConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("radon.json"),
            backend: BackendKind::Json.to_string(),
            operator: String::new(),
            stock_baseline: DEFAULT_STOCK_BASELINE,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl RadonConfig {
    /// Load defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist; the implicit `radon.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, RadonError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, RadonError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RadonError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "configuration file loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, RadonError> {
        toml::from_str(text)
            .map_err(|e| RadonError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Apply `RADON_*` overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), RadonError> {
        if let Some(db) = lookup("RADON_DB") {
            self.database = PathBuf::from(db);
        }
        if let Some(backend) = lookup("RADON_BACKEND") {
            self.backend = backend;
        }
        if let Some(operator) = lookup("RADON_OPERATOR") {
            self.operator = operator;
        }
        if let Some(baseline) = lookup("RADON_STOCK_BASELINE") {
            self.stock_baseline = baseline.trim().parse().map_err(|_| {
                RadonError::SerializationError(format!(
                    "RADON_STOCK_BASELINE must be a whole number, got '{}'",
                    baseline
                ))
            })?;
        }
        if let Some(host) = lookup("RADON_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("RADON_PORT") {
            self.port = port.trim().parse().map_err(|_| {
                RadonError::SerializationError(format!("RADON_PORT must be a port, got '{}'", port))
            })?;
        }
        Ok(())
    }

    pub fn backend_kind(&self) -> Result<BackendKind, RadonError> {
        self.backend.parse()
    }

    /// Open the configured store.
    pub fn open_registry(&self) -> Result<CampaignRegistry, RadonError> {
        let backend = StorageBackend::open(self.backend_kind()?, &self.database)?;
        Ok(CampaignRegistry::new(backend, self.stock_baseline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = RadonConfig::default();
        assert_eq!(config.stock_baseline, 250);
        assert_eq!(config.backend_kind().ok(), Some(BackendKind::Json));
    }

    #[test]
    fn toml_fills_missing_with_defaults() {
        let config = RadonConfig::from_toml("backend = \"redb\"\noperator = \"Anna\"\n")
            .expect("parse");
        assert_eq!(config.backend_kind().ok(), Some(BackendKind::Redb));
        assert_eq!(config.operator, "Anna");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn wrong_value_type_is_error() {
        assert!(RadonConfig::from_toml("stock_baseline = \"many\"").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("RADON_DB", "/tmp/x.redb"),
            ("RADON_BACKEND", "redb"),
            ("RADON_STOCK_BASELINE", "400"),
        ]
        .into_iter()
        .collect();

        let mut config = RadonConfig::from_toml("stock_baseline = 10").expect("parse");
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .expect("apply");
        assert_eq!(config.stock_baseline, 400);
        assert_eq!(config.database, PathBuf::from("/tmp/x.redb"));
        assert_eq!(config.backend_kind().ok(), Some(BackendKind::Redb));
    }

    #[test]
    fn bad_env_number_is_error() {
        let mut config = RadonConfig::default();
        let result = config.apply_env(|k| (k == "RADON_STOCK_BASELINE").then(|| "lots".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        assert!(RadonConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
