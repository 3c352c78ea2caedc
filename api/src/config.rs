use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub deepseek_api_key: Option<String>,
    pub deepseek_base_url: String,
    pub deepseek_model: String,
    pub deepseek_timeout: Duration,
    /// Characters of extracted text returned by `/upload`.
    pub preview_chars: usize,
    /// Characters of extracted text sent to the model with each question.
    pub max_context_chars: usize,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            deepseek_api_key: None,
            deepseek_base_url: "https://api.deepseek.com".to_string(),
            deepseek_model: "deepseek-chat".to_string(),
            deepseek_timeout: Duration::from_secs(60),
            preview_chars: 2000,
            max_context_chars: 8000,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let deepseek_api_key = lookup("DEEPSEEK_API_KEY").filter(|key| !key.trim().is_empty());
        if deepseek_api_key.is_none() {
            log::warn!("DEEPSEEK_API_KEY is not set; /ask will fail until it is configured");
        }

        Ok(Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            deepseek_api_key,
            deepseek_base_url: lookup("DEEPSEEK_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.deepseek_base_url),
            deepseek_model: lookup("DEEPSEEK_MODEL").unwrap_or(defaults.deepseek_model),
            deepseek_timeout: Duration::from_secs(parse_var(
                &lookup,
                "DEEPSEEK_TIMEOUT_SECS",
                defaults.deepseek_timeout.as_secs(),
            )?),
            preview_chars: parse_var(&lookup, "PREVIEW_CHARS", defaults.preview_chars)?,
            max_context_chars: parse_var(&lookup, "MAX_CONTEXT_CHARS", defaults.max_context_chars)?,
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, value)),
        None => Ok(default),
    }
}
