//! Process configuration
//!
//! Values come from the environment, optionally seeded from a `.env` file.
//! Variables already present in the environment win over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{BotError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 1200;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_RETRIEVER_URL: &str = "http://localhost:9721";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_CACHE_CLEANUP_SECS: u64 = 600;

/// Settings for one ragguard process
#[derive(Debug, Clone)]
pub struct Settings {
    /// Credential for the completion/embedding provider
    pub openai_api_key: String,
    /// Base URL of an OpenAI-compatible API
    pub openai_base_url: String,
    pub embedding_model: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub temperature: f32,
    /// Base URL of the retrieval service
    pub retriever_url: String,
    pub response_cache_ttl: Duration,
    pub embedding_cache_ttl: Duration,
    /// Period of the background embedding sweep in `serve` mode
    pub embedding_cleanup_interval: Duration,
    /// Optional YAML file overriding the built-in guardrail data
    pub guardrails_file: Option<PathBuf>,
    /// Key required by the HTTP layer; auth is off when unset
    pub api_key: Option<String>,
}

impl Settings {
    /// Load settings, reading `env_file` (or `./.env` when present) first
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) => {
                dotenv::from_path(path).map_err(|e| {
                    BotError::Configuration(format!(
                        "Failed to read env file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                info!("Loaded environment from {}", path.display());
            }
            None => {
                if let Ok(path) = dotenv::dotenv() {
                    debug!("Loaded environment from {}", path.display());
                }
            }
        }

        Self::from_env()
    }

    /// Build settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            BotError::Configuration(
                "OPENAI_API_KEY not found in environment variables or env file".to_string(),
            )
        })?;

        let openai_base_url = get("OPENAI_BASE_URL")
            .or_else(|| get("OPENAI_API_BASE"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            openai_api_key,
            openai_base_url,
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            llm_model: get("OPENAI_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            llm_max_tokens: parse_or(
                get("OPENAI_LLM_MAX_TOKENS"),
                "OPENAI_LLM_MAX_TOKENS",
                DEFAULT_LLM_MAX_TOKENS,
            )?,
            temperature: parse_or(
                get("LLM_TEMPERATURE"),
                "LLM_TEMPERATURE",
                DEFAULT_TEMPERATURE,
            )?,
            retriever_url: get("RETRIEVER_URL")
                .unwrap_or_else(|| DEFAULT_RETRIEVER_URL.to_string()),
            response_cache_ttl: Duration::from_secs(parse_or(
                get("RESPONSE_CACHE_TTL_SECS"),
                "RESPONSE_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
            embedding_cache_ttl: Duration::from_secs(parse_or(
                get("EMBEDDING_CACHE_TTL_SECS"),
                "EMBEDDING_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
            embedding_cleanup_interval: Duration::from_secs(parse_or(
                get("EMBEDDING_CACHE_CLEANUP_SECS"),
                "EMBEDDING_CACHE_CLEANUP_SECS",
                DEFAULT_CACHE_CLEANUP_SECS,
            )?),
            guardrails_file: get("GUARDRAILS_FILE").map(PathBuf::from),
            api_key: get("API_KEY"),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            BotError::Configuration(format!("{} has an invalid value: {:?}", key, value))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let result = Settings::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(BotError::Configuration(_))));

        let result = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")]));
        assert!(matches!(result, Err(BotError::Configuration(_))));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(settings.openai_api_key, "sk-test");
        assert_eq!(settings.openai_base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.embedding_model, "text-embedding-3-small");
        assert_eq!(settings.llm_model, "gpt-4o-mini");
        assert_eq!(settings.llm_max_tokens, 1200);
        assert_eq!(settings.response_cache_ttl, Duration::from_secs(3600));
        assert_eq!(settings.embedding_cleanup_interval, Duration::from_secs(600));
        assert!(settings.api_key.is_none());
        assert!(settings.guardrails_file.is_none());
    }

    #[test]
    fn test_overrides_and_base_url_alias() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_API_BASE", "http://localhost:4000/v1"),
            ("OPENAI_LLM_MAX_TOKENS", "800"),
            ("RETRIEVER_URL", "http://rag:9721"),
            ("API_KEY", "secret"),
            ("EMBEDDING_CACHE_CLEANUP_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(settings.openai_base_url, "http://localhost:4000/v1");
        assert_eq!(settings.llm_max_tokens, 800);
        assert_eq!(settings.retriever_url, "http://rag:9721");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.embedding_cleanup_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_LLM_MAX_TOKENS", "lots"),
        ]));
        assert!(matches!(result, Err(BotError::Configuration(_))));
    }

    #[test]
    fn test_missing_env_file_is_configuration_error() {
        let result = Settings::load(Some(Path::new("/definitely/not/here/.env")));
        assert!(matches!(result, Err(BotError::Configuration(_))));
    }

    #[test]
    fn test_load_reads_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "OPENAI_API_KEY=sk-from-file").unwrap();
        writeln!(file, "GUARDRAILS_FILE=/etc/ragguard/guardrails-from-file.yaml").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(
            settings.guardrails_file,
            Some(PathBuf::from("/etc/ragguard/guardrails-from-file.yaml"))
        );
        assert!(!settings.openai_api_key.is_empty());
    }
}
