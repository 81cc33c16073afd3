//! Application settings loading from config.toml
//!
//! Every section is optional; missing values fall back to defaults so the service starts
//! with no file at all. `DATABASE_URL` and `BIND_ADDRESS` in the environment override the
//! file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// List endpoint paging limits
    pub pagination: PaginationConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Origins allowed by CORS; empty allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

/// `[database]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SeaORM connection URL, e.g. `sqlite://data/canteen_pay.sqlite?mode=rwc`
    pub url: Option<String>,
}

/// `[pagination]` section
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the client sends no `limit`
    pub default_limit: u64,
    /// Largest page size a client may request
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Parses configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.pagination.default_limit == 0 || config.pagination.max_limit == 0 {
        return Err(Error::Config {
            message: "Pagination limits must be greater than zero".to_string(),
        });
    }
    if config.pagination.default_limit > config.pagination.max_limit {
        return Err(Error::Config {
            message: "pagination.default_limit cannot exceed pagination.max_limit".to_string(),
        });
    }

    Ok(config)
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Pagination limits are inconsistent
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads the application configuration.
///
/// Reads the file named by `CONFIG_PATH` (default `config.toml`) when it exists, otherwise
/// starts from defaults, then applies environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

    let mut config = if Path::new(&path).exists() {
        let config = load_config(&path)?;
        info!("Loaded configuration from {}", path);
        config
    } else {
        warn!("No configuration file at {}, using defaults", path);
        AppConfig::default()
    };

    if let Ok(bind_address) = std::env::var("BIND_ADDRESS") {
        config.server.bind_address = bind_address;
    }
    config.database.url = Some(super::database::get_database_url(
        config.database.url.as_deref(),
    ));

    Ok(config)
}
