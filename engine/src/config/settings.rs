// Engine settings: defaults, optionally overridden by a JSON file, then by
// environment variables (a local .env is loaded by the binary beforehand).
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};

pub const CACHE_TTL_ENV: &str = "FINBOARD_CACHE_TTL_SECS";
pub const LOG_LEVEL_ENV: &str = "FINBOARD_LOG_LEVEL";

/// Providers that need a key, named after the environment variable holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKeyName {
    TwelveData,
    AlphaVantage,
    Finnhub,
    IndianApi,
}

impl ApiKeyName {
    pub const ALL: [ApiKeyName; 4] = [
        ApiKeyName::TwelveData,
        ApiKeyName::AlphaVantage,
        ApiKeyName::Finnhub,
        ApiKeyName::IndianApi,
    ];

    pub fn env_var(&self) -> &'static str {
        match self {
            ApiKeyName::TwelveData => "TWELVE_DATA_API_KEY",
            ApiKeyName::AlphaVantage => "ALPHA_VANTAGE_API_KEY",
            ApiKeyName::Finnhub => "FINNHUB_API_KEY",
            ApiKeyName::IndianApi => "INDIAN_API_KEY",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ApiKeys {
    pub twelve_data: Option<String>,
    pub alpha_vantage: Option<String>,
    pub finnhub: Option<String>,
    pub indian_api: Option<String>,
}

impl ApiKeys {
    pub fn get(&self, name: ApiKeyName) -> Option<&str> {
        let key = match name {
            ApiKeyName::TwelveData => &self.twelve_data,
            ApiKeyName::AlphaVantage => &self.alpha_vantage,
            ApiKeyName::Finnhub => &self.finnhub,
            ApiKeyName::IndianApi => &self.indian_api,
        };
        key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn set(&mut self, name: ApiKeyName, value: impl Into<String>) {
        let slot = match name {
            ApiKeyName::TwelveData => &mut self.twelve_data,
            ApiKeyName::AlphaVantage => &mut self.alpha_vantage,
            ApiKeyName::Finnhub => &mut self.finnhub,
            ApiKeyName::IndianApi => &mut self.indian_api,
        };
        *slot = Some(value.into());
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub cache_ttl_secs: u64,
    pub log_level: String,
    pub api_keys: ApiKeys,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            cache_ttl_secs: 30,
            log_level: "info".to_string(),
            api_keys: ApiKeys::default(),
        }
    }
}

impl EngineSettings {
    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| EngineError::ConfigError(format!("Invalid settings file '{}': {}", path.display(), e)))
    }

    /// Override fields from environment-style lookups. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> EngineResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for name in ApiKeyName::ALL {
            if let Some(key) = lookup(name.env_var()) {
                self.api_keys.set(name, key);
            }
        }
        if let Some(ttl) = lookup(CACHE_TTL_ENV) {
            self.cache_ttl_secs = ttl.trim().parse().map_err(|_| {
                EngineError::ConfigError(format!("{} must be a whole number of seconds, got '{}'", CACHE_TTL_ENV, ttl))
            })?;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
