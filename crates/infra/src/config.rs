//! Server configuration from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use skuforge_catalog::VocabularySet;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("failed to read vocabulary file {path}: {message}")]
    Vocabulary { path: PathBuf, message: String },
}

/// Where the server keeps issued SKUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "sqlite" => Ok(StoreKind::Sqlite),
            other => Err(format!("expected 'memory' or 'sqlite', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub jwt_secret: String,
    /// True when `JWT_SECRET` was not set and the insecure default is in use.
    pub jwt_secret_is_default: bool,
    pub token_ttl: Duration,
    pub store: StoreKind,
    pub sqlite_path: PathBuf,
    pub vocabulary_file: Option<PathBuf>,
}

impl AppConfig {
    /// Read the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!("ignoring unreadable .env file: {err}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(get("PORT"), "PORT", 5000u16)?;
        let ttl_minutes = parse_or(get("TOKEN_TTL_MINUTES"), "TOKEN_TTL_MINUTES", 1440i64)?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                message: "must be positive".into(),
            });
        }
        let store = parse_or(get("SKU_STORE"), "SKU_STORE", StoreKind::Memory)?;

        let (jwt_secret, jwt_secret_is_default) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            jwt_secret,
            jwt_secret_is_default,
            token_ttl: Duration::minutes(ttl_minutes),
            store,
            sqlite_path: get("SKU_SQLITE_PATH").map(PathBuf::from).unwrap_or_else(|| "skuforge.db".into()),
            vocabulary_file: get("SKU_VOCABULARY_FILE").map(PathBuf::from),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// The configured vocabulary file, or the standard vocabulary.
    pub fn load_vocabulary(&self) -> Result<VocabularySet, ConfigError> {
        let Some(path) = &self.vocabulary_file else {
            return Ok(VocabularySet::standard());
        };

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Vocabulary {
            path: path.clone(),
            message: e.to_string(),
        })?;
        VocabularySet::from_json(&text).map_err(|e| ConfigError::Vocabulary {
            path: path.clone(),
            message: e.to_string(),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}
