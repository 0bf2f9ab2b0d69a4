use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub queue_poll_timeout: Duration,
    pub job_timeout: Duration,
    pub context_index: Option<ContextIndexConfig>,
}

/// Settings for the nearest-neighbor context index.
/// Present only when both the Qdrant URL and an embeddings key are configured.
#[derive(Debug, Clone)]
pub struct ContextIndexConfig {
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub seed: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            queue_poll_timeout: Duration::from_secs(env_u64("QUEUE_POLL_TIMEOUT_SECS", 1)?),
            job_timeout: Duration::from_secs(env_u64("JOB_TIMEOUT_SECS", 300)?),
            context_index: ContextIndexConfig::from_env()?,
        })
    }
}

impl ContextIndexConfig {
    fn from_env() -> Result<Option<Self>> {
        let (Some(qdrant_url), Some(openai_api_key)) =
            (optional_env("QDRANT_URL"), optional_env("OPENAI_API_KEY"))
        else {
            return Ok(None);
        };

        Ok(Some(ContextIndexConfig {
            qdrant_url,
            qdrant_api_key: optional_env("QDRANT_API_KEY"),
            collection: optional_env("QDRANT_COLLECTION")
                .unwrap_or_else(|| "job_requirements".to_string()),
            openai_api_key,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            seed: parse_flag(optional_env("SEED_CONTEXT_INDEX").as_deref())
                .context("SEED_CONTEXT_INDEX must be true or false")?,
        }))
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns the variable's value, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match optional_env(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds")),
        None => Ok(default),
    }
}

fn parse_flag(raw: Option<&str>) -> Result<bool> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => anyhow::bail!("unrecognized flag value '{other}'"),
    }
}
