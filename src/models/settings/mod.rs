// Settings module
// Dashboard configuration as read from config.toml

use std::fmt;
use std::path::PathBuf;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub display: DisplaySettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        self.provider.validate()?;
        self.display.validate()?;
        Ok(())
    }
}

/// Connection details for the platform's REST API.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub retry_delay_millis: u64,
    pub max_response_bytes: usize,
    /// Permits plain `http://` base URLs, for a backend running locally.
    pub allow_insecure_http: bool,
}

impl ProviderSettings {
    pub fn validate(&self) -> Result<(), String> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err("provider.base_url is not configured".to_string());
        }

        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(format!("provider.base_url '{}' is not an http(s) URL", base_url));
        }

        if self.timeout_seconds == 0 {
            return Err("provider.timeout_seconds must be greater than 0".to_string());
        }

        if self.max_response_bytes == 0 {
            return Err("provider.max_response_bytes must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            timeout_seconds: 20,
            max_retries: 2,
            retry_delay_millis: 400,
            max_response_bytes: 5 * 1024 * 1024,
            allow_insecure_http: false,
        }
    }
}

// Hand-written so the bearer token never reaches a log line.
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_millis", &self.retry_delay_millis)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("allow_insecure_http", &self.allow_insecure_http)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Zero disables caching.
    pub ttl_seconds: u64,
    pub path: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            path: None,
        }
    }
}

const MAX_REFRESH_MARGIN_MILLIS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub tick_millis: u64,
    pub refresh_margin_millis: u64,
    /// IANA zone name used for absolute times; local time when unset.
    pub timezone: Option<String>,
    pub warning_seconds: u64,
    pub critical_seconds: u64,
}

impl DisplaySettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_millis == 0 {
            return Err("display.tick_millis must be greater than 0".to_string());
        }

        if self.refresh_margin_millis > MAX_REFRESH_MARGIN_MILLIS {
            return Err(format!(
                "display.refresh_margin_millis must be at most {}",
                MAX_REFRESH_MARGIN_MILLIS
            ));
        }

        if self.critical_seconds >= self.warning_seconds {
            return Err(format!(
                "display.critical_seconds ({}) must be below display.warning_seconds ({})",
                self.critical_seconds, self.warning_seconds
            ));
        }

        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Option<Tz>, String> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name
                .parse::<Tz>()
                .map(Some)
                .map_err(|_| format!("display.timezone '{}' is not a known time zone", name)),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            tick_millis: 1000,
            refresh_margin_millis: 1000,
            timezone: None,
            warning_seconds: 600,
            critical_seconds: 60,
        }
    }
}
