use std::env;

use anyhow::{anyhow, Result};
use tracing::warn;

use crate::error::StudioError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_image_model: String,
    pub gemini_suggestion_model: String,
    pub gemini_safety_settings: String,
    pub http_timeout_seconds: u64,
    pub world_suggestion_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            gemini_api_key: String::new(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_image_model: "gemini-2.5-flash-image".to_string(),
            gemini_suggestion_model: "gemini-3-flash-preview".to_string(),
            gemini_safety_settings: "permissive".to_string(),
            http_timeout_seconds: 120,
            world_suggestion_count: 10,
        }
    }
}

fn env_string(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn env_u64(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> u64 {
    lookup(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: usize) -> usize {
    lookup(name)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn ambient_api_key(lookup: &impl Fn(&str) -> Option<String>) -> String {
    let primary = env_string(lookup, "GEMINI_API_KEY", "");
    if !primary.trim().is_empty() {
        return primary.trim().to_string();
    }
    env_string(lookup, "API_KEY", "").trim().to_string()
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "permissive".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to permissive.",
                value
            );
            "permissive".to_string()
        }
    }
}

fn normalize_base_url(value: String) -> String {
    value.trim().trim_end_matches('/').to_string()
}

impl Config {
    /// Loads `.env` (if present) and then reads the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let gemini_base_url = normalize_base_url(env_string(
            &lookup,
            "GEMINI_BASE_URL",
            &defaults.gemini_base_url,
        ));
        if gemini_base_url.is_empty() {
            return Err(anyhow!("GEMINI_BASE_URL must not be empty"));
        }

        let http_timeout_seconds =
            env_u64(&lookup, "HTTP_TIMEOUT_SECONDS", defaults.http_timeout_seconds);
        if http_timeout_seconds == 0 {
            return Err(anyhow!("HTTP_TIMEOUT_SECONDS must be greater than zero"));
        }

        Ok(Config {
            log_level: env_string(&lookup, "LOG_LEVEL", &defaults.log_level).to_lowercase(),
            log_dir: env_string(&lookup, "LOG_DIR", &defaults.log_dir),
            gemini_api_key: ambient_api_key(&lookup),
            gemini_base_url,
            gemini_image_model: env_string(
                &lookup,
                "GEMINI_IMAGE_MODEL",
                &defaults.gemini_image_model,
            ),
            gemini_suggestion_model: env_string(
                &lookup,
                "GEMINI_SUGGESTION_MODEL",
                &defaults.gemini_suggestion_model,
            ),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                &lookup,
                "GEMINI_SAFETY_SETTINGS",
                &defaults.gemini_safety_settings,
            )),
            http_timeout_seconds,
            world_suggestion_count: env_usize(
                &lookup,
                "WORLD_SUGGESTION_COUNT",
                defaults.world_suggestion_count,
            )
            .max(1),
        })
    }
}

/// A resolved provider credential. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        ApiKey(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replaces every occurrence of the key in `text`.
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_string();
        }
        text.replace(&self.0, "[redacted]")
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([redacted])")
    }
}

pub struct Credentials;

impl Credentials {
    /// User-supplied key first, ambient configuration second.
    pub fn resolve(user_key: Option<&str>, config: &Config) -> Result<ApiKey, StudioError> {
        let user_key = user_key.map(str::trim).filter(|key| !key.is_empty());
        if let Some(key) = user_key {
            return Ok(ApiKey::new(key));
        }

        let ambient = config.gemini_api_key.trim();
        if !ambient.is_empty() {
            return Ok(ApiKey::new(ambient));
        }

        Err(StudioError::MissingCredential)
    }
}
