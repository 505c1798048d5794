use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value `{value}`")]
    Invalid { var: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Dataset every document belongs to.
    pub dataset: String,
    /// NDJSON documents loaded into the memory store at boot.
    pub seed_file: Option<PathBuf>,
    /// Origin used for canonical links, JSON-LD, the sitemap and QR targets.
    pub public_base_url: String,
    pub site_name: String,
    /// Uploaded images live here and are served under `/assets`.
    pub assets_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Argon2 PHC hash of the admin password. Login is disabled without it.
    pub admin_password_hash: Option<String>,
    pub token_ttl_minutes: i64,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3030,
            database_url: None,
            db_max_connections: 20,
            db_min_connections: 5,
            dataset: "production".to_string(),
            seed_file: None,
            public_base_url: "http://localhost:3030".to_string(),
            site_name: "Sobremesa".to_string(),
            assets_dir: PathBuf::from("./data/assets"),
            max_upload_bytes: 10 * 1024 * 1024,
            jwt_secret: "dev-secret-change-me-in-production".to_string(),
            admin_password_hash: None,
            token_ttl_minutes: 720,
            event_bus_capacity: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse(&get, "PORT", defaults.port)?,
            database_url: get("DATABASE_URL"),
            db_max_connections: parse(&get, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_min_connections: parse(&get, "DB_MIN_CONNECTIONS", defaults.db_min_connections)?,
            dataset: get("DATASET").unwrap_or(defaults.dataset),
            seed_file: get("SEED_FILE").map(PathBuf::from),
            public_base_url: get("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            site_name: get("SITE_NAME").unwrap_or(defaults.site_name),
            assets_dir: get("ASSETS_DIR").map(PathBuf::from).unwrap_or(defaults.assets_dir),
            max_upload_bytes: parse(&get, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            admin_password_hash: get("ADMIN_PASSWORD_HASH"),
            token_ttl_minutes: parse(&get, "TOKEN_TTL_MINUTES", defaults.token_ttl_minutes)?,
            event_bus_capacity: parse(&get, "EVENT_BUS_CAPACITY", defaults.event_bus_capacity)?,
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Absolute URL for a site path.
    pub fn absolute_url(&self, path: &str) -> String {
        sobremesa_core::content::urls::absolute(&self.public_base_url, path)
    }
}

fn parse<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_select_memory_store() {
        let config = from(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.addr(), "0.0.0.0:3030");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.site_name, "Sobremesa");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = from(&[
            ("PORT", "8080"),
            ("PUBLIC_BASE_URL", "https://sobremesa.es/"),
            ("DATABASE_URL", "postgres://localhost/sobremesa"),
            ("SEED_FILE", " "),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.absolute_url("/madrid"), "https://sobremesa.es/madrid");
        assert!(config.database_url.is_some());
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value `eighty`");
    }
}
