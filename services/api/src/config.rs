//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use study_assistant_core::AnalyticsPolicy;
use tracing::Level;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which completion provider the API key belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
}

/// Credentials and endpoint for the completion service.
#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub api_key: String,
    /// `None` means the client library's default endpoint.
    pub api_base: Option<String>,
    pub model: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent the service keeps study state in memory only.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub generation: GenerationConfig,
    pub catalog_path: Option<PathBuf>,
    pub analytics_policy: AnalyticsPolicy,
    pub cors_origin: String,
}

/// Reads a variable, treating an empty value as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

impl GenerationConfig {
    /// Picks the provider from whichever key is set, preferring Gemini.
    fn from_env() -> Result<Self, ConfigError> {
        let (provider, api_key) = match (optional_var("GEMINI_API_KEY"), optional_var("OPENAI_API_KEY")) {
            (Some(key), _) => (Provider::Gemini, key),
            (None, Some(key)) => (Provider::OpenAi, key),
            (None, None) => {
                return Err(ConfigError::MissingVar(
                    "GEMINI_API_KEY or OPENAI_API_KEY".to_string(),
                ))
            }
        };

        let api_base = optional_var("GENERATION_API_BASE").or_else(|| match provider {
            Provider::Gemini => Some(GEMINI_API_BASE.to_string()),
            Provider::OpenAi => None,
        });

        let model = optional_var("GENERATION_MODEL").unwrap_or_else(|| {
            match provider {
                Provider::Gemini => GEMINI_DEFAULT_MODEL,
                Provider::OpenAi => OPENAI_DEFAULT_MODEL,
            }
            .to_string()
        });

        Ok(Self {
            provider,
            api_key,
            api_base,
            model,
        })
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Storage ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = optional_var("DATABASE_URL");

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generation ---
        let generation = GenerationConfig::from_env()?;

        // --- Study Settings ---
        let catalog_path = optional_var("CATALOG_PATH").map(PathBuf::from);

        let analytics_policy = match optional_var("PERSIST_QUIZ_RESULTS") {
            Some(value) if parse_bool("PERSIST_QUIZ_RESULTS", &value)? => AnalyticsPolicy::Persisted,
            _ => AnalyticsPolicy::SessionOnly,
        };

        let cors_origin =
            optional_var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            generation,
            catalog_path,
            analytics_policy,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_accept_common_spellings() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(parse_bool("X", " on ").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(matches!(
            parse_bool("X", "maybe"),
            Err(ConfigError::InvalidValue(name, _)) if name == "X"
        ));
    }
}
