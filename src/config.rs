//! Runtime configuration
//!
//! Values come from the process environment (the binary loads `.env` first).
//! Everything is resolved up front so a missing credential is reported before
//! any request is made.

use crate::error::FactFindError;
use crate::Result;
use std::env;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Placeholder shipped in `.env.example`
const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

/// Connection settings for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: i32,
}

impl GeminiConfig {
    /// Config with default model and endpoint for the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: 0.2,
            max_output_tokens: 1024,
        }
    }

    /// Read `GEMINI_*` variables from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .map(|key| key.trim().to_string())
            .unwrap_or_default();

        validate_api_key(&api_key)?;

        let mut config = Self::new(api_key);

        if let Some(model) = non_empty(lookup("GEMINI_MODEL")) {
            config.model = model;
        }
        if let Some(base_url) = non_empty(lookup("GEMINI_BASE_URL")) {
            config.base_url = base_url;
        }
        if let Some(raw) = non_empty(lookup("GEMINI_TEMPERATURE")) {
            config.temperature = raw.parse().map_err(|_| {
                FactFindError::ConfigError(format!("GEMINI_TEMPERATURE is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = non_empty(lookup("GEMINI_MAX_OUTPUT_TOKENS")) {
            config.max_output_tokens = raw.parse().map_err(|_| {
                FactFindError::ConfigError(format!(
                    "GEMINI_MAX_OUTPUT_TOKENS is not an integer: {}",
                    raw
                ))
            })?;
        }

        Ok(config)
    }

    /// Full `generateContent` URL for the configured model
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

pub(crate) fn validate_api_key(api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() || api_key == PLACEHOLDER_API_KEY {
        return Err(FactFindError::ConfigError(
            "GEMINI_API_KEY not configured. \
             Set it in your environment or .env file (see .env.example)"
                .to_string(),
        ));
    }
    Ok(())
}

/// Behaviour switches for the fact-find conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactFinderSettings {
    /// Use today's date when a new user is created without a date of birth
    pub dob_fallback_today: bool,
}

impl Default for FactFinderSettings {
    fn default() -> Self {
        Self {
            dob_fallback_today: true,
        }
    }
}

impl FactFinderSettings {
    /// Read `FACTFIND_*` variables from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(raw) = non_empty(lookup("FACTFIND_DOB_FALLBACK")) {
            settings.dob_fallback_today = parse_bool(&raw).ok_or_else(|| {
                FactFindError::ConfigError(format!(
                    "FACTFIND_DOB_FALLBACK is not a boolean: {}",
                    raw
                ))
            })?;
        }

        Ok(settings)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
