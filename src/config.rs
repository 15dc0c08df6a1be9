// src/config.rs
//! Runtime configuration for the certificate system.
//!
//! Settings resolve in three layers: built-in defaults, an optional
//! `certificate-system.toml` file in the working directory, and `CERT_*`
//! environment variables (highest precedence). A `.env` file is honored
//! through `dotenv` in the binary entry point.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Resolved runtime settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Directory holding the RSA key pair PEM files
    pub keys_dir: String,

    /// Path of the certificate store JSON document
    pub storage_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            keys_dir: "./keys".to_string(),
            storage_path: "./data/certificates.json".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults, the optional config file, and the
    /// environment.
    ///
    /// # Environment
    /// - `CERT_KEYS_DIR` overrides `keys_dir`
    /// - `CERT_STORAGE_PATH` overrides `storage_path`
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        Config::builder()
            .set_default("keys_dir", defaults.keys_dir)?
            .set_default("storage_path", defaults.storage_path)?
            .add_source(File::with_name("certificate-system").required(false))
            .add_source(Environment::with_prefix("CERT"))
            .build()?
            .try_deserialize()
    }
}
