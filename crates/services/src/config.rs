use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const AUTOSAVE_ENABLED_VAR: &str = "CAREPLAN_AUTOSAVE_ENABLED";
pub const AUTOSAVE_QUIET_MS_VAR: &str = "CAREPLAN_AUTOSAVE_QUIET_MS";
pub const SAVE_STATUS_MS_VAR: &str = "CAREPLAN_SAVE_STATUS_MS";
pub const API_BASE_URL_VAR: &str = "CAREPLAN_API_BASE_URL";
pub const API_TOKEN_VAR: &str = "CAREPLAN_API_TOKEN";

/// Autosave behaviour for one form session.
///
/// Read once at startup and passed into each session, so two sessions in the
/// same process can run with different settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Idle time after the last qualifying edit before a save fires.
    pub quiet_period: Duration,
    /// How long `Saved` / `Error` stay visible before reverting to `Idle`.
    pub status_display: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quiet_period: Duration::from_millis(2000),
            status_display: Duration::from_millis(3000),
        }
    }
}

impl AutosaveConfig {
    /// Manual save only.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. Unset or blank keys fall
    /// back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let enabled = match non_blank(lookup(AUTOSAVE_ENABLED_VAR)) {
            Some(raw) => parse_bool(AUTOSAVE_ENABLED_VAR, raw)?,
            None => defaults.enabled,
        };
        let quiet_period = match non_blank(lookup(AUTOSAVE_QUIET_MS_VAR)) {
            Some(raw) => parse_millis(AUTOSAVE_QUIET_MS_VAR, raw)?,
            None => defaults.quiet_period,
        };
        let status_display = match non_blank(lookup(SAVE_STATUS_MS_VAR)) {
            Some(raw) => parse_millis(SAVE_STATUS_MS_VAR, raw)?,
            None => defaults.status_display,
        };
        Ok(Self {
            enabled,
            quiet_period,
            status_display,
        })
    }
}

/// Remote persistence API. Absent config means responses stay in the local
/// database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the base URL is set but invalid.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the base URL is set but invalid.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(raw) = non_blank(lookup(API_BASE_URL_VAR)) else {
            return Ok(None);
        };
        let base_url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
            key: API_BASE_URL_VAR,
            source,
        })?;
        let token = non_blank(lookup(API_TOKEN_VAR));
        Ok(Some(Self { base_url, token }))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(key: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, raw }),
    }
}

fn parse_millis(key: &'static str, raw: String) -> Result<Duration, ConfigError> {
    raw.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidMillis { key, raw })
}
