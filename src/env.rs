use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for environment variable {key}")]
    Invalid { key: &'static str, value: String },

    #[error("Failed to load environment file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Runtime settings, read once at startup and managed by Rocket.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub session_cleanup_interval_secs: u64,
    pub csv_import_limit_kib: u64,
    pub otlp_endpoint: Option<String>,
    pub otlp_api_key: Option<String>,
    pub deployment_environment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            session_ttl_hours: 12,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            session_cleanup_interval_secs: 3600,
            csv_import_limit_kib: 5 * 1024,
            otlp_endpoint: None,
            otlp_api_key: None,
            deployment_environment: "develop".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let database_url = dotenvy::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let session_ttl_hours = parse_var("SESSION_TTL_HOURS", defaults.session_ttl_hours)?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_HOURS",
                value: session_ttl_hours.to_string(),
            });
        }

        let bcrypt_cost = parse_var("BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let session_cleanup_interval_secs = parse_var(
            "SESSION_CLEANUP_INTERVAL_SECS",
            defaults.session_cleanup_interval_secs,
        )?;
        if session_cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_CLEANUP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let csv_import_limit_kib =
            parse_var("CSV_IMPORT_LIMIT_KIB", defaults.csv_import_limit_kib)?;
        if csv_import_limit_kib == 0 {
            return Err(ConfigError::Invalid {
                key: "CSV_IMPORT_LIMIT_KIB",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            session_ttl_hours,
            bcrypt_cost,
            session_cleanup_interval_secs,
            csv_import_limit_kib,
            otlp_endpoint: optional_var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            otlp_api_key: optional_var("OTLP_API_KEY"),
            deployment_environment: optional_var("DEPLOYMENT_ENVIRONMENT")
                .unwrap_or(defaults.deployment_environment),
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    dotenvy::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Outcome of reading one env file. Loading happens before the subscriber
/// exists, so these are logged once tracing is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileLoad {
    Loaded(PathBuf),
    Missing(PathBuf),
}

impl EnvFileLoad {
    pub fn log(&self) {
        match self {
            EnvFileLoad::Loaded(path) => info!("Loaded environment from: {}", path.display()),
            EnvFileLoad::Missing(path) => {
                warn!("Environment file {} not found, skipping", path.display())
            }
        }
    }
}

pub fn load_environment() -> Result<Vec<EnvFileLoad>, ConfigError> {
    load_environment_from(Path::new("."))
}

/// Loads the common file, the profile file, then `.secrets.env`, each
/// overriding values set by the ones before it.
pub fn load_environment_from(base: &Path) -> Result<Vec<EnvFileLoad>, ConfigError> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    env_files
        .into_iter()
        .map(|env_file| load_env_file(base.join(env_file)))
        .collect()
}

fn load_env_file(path: PathBuf) -> Result<EnvFileLoad, ConfigError> {
    if !path.exists() {
        return Ok(EnvFileLoad::Missing(path));
    }

    dotenvy::from_filename_override(&path).map_err(|source| ConfigError::EnvFile {
        path: path.display().to_string(),
        source,
    })?;
    Ok(EnvFileLoad::Loaded(path))
}
