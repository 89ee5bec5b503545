//! Configuration parsed from environment variables.
//!
//! Each service gets its own typed struct with `DEFAULT_*` fallbacks. Numeric
//! knobs that fail to parse fall back to their default; missing required
//! values are a [`ConfigError`]. The CLI layers its flags on top.

use std::time::Duration;

use canvas::engine::Surface;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_GENERATION_RETRIES: u32 = 2;
pub const DEFAULT_GENERATION_RETRY_DELAY_MS: u64 = 800;
pub const DEFAULT_SAVED_RESET_MS: u64 = 2000;
pub const DEFAULT_ERROR_RESET_MS: u64 = 3000;
pub const DEFAULT_EXPORT_SCALE: f32 = 2.0;
pub const DEFAULT_EXPORT_BACKGROUND: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable {var}")]
    MissingVar { var: String },
    /// `PLANBOARD_API_KEY_ENV` names a variable that is unset.
    #[error("API key variable {var} is not set")]
    MissingApiKey { var: String },
}

impl crate::error::UserFacing for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingVar { .. } => "E_CONFIG_MISSING",
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    fn from_env() -> Self {
        Self {
            request_secs: env_parse("PLANBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("PLANBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

// =============================================================================
// BACKEND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeouts: Timeouts,
}

impl BackendConfig {
    /// Required: `PLANBOARD_BACKEND_URL`.
    ///
    /// Optional:
    /// - `PLANBOARD_API_KEY_ENV` (names the env var containing the key)
    /// - `PLANBOARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PLANBOARD_CONNECT_TIMEOUT_SECS`: default 10
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = required_url("PLANBOARD_BACKEND_URL")?;
        Ok(Self { base_url, api_key: api_key_from_env()?, timeouts: Timeouts::from_env() })
    }
}

// =============================================================================
// GENERATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Base URL; functions live under `{functions_url}/functions/v1/`.
    pub functions_url: String,
    pub api_key: Option<String>,
    pub connect_secs: u64,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl GenerationConfig {
    /// Required: `PLANBOARD_FUNCTIONS_URL`, falling back to `PLANBOARD_BACKEND_URL`.
    ///
    /// Optional:
    /// - `PLANBOARD_API_KEY_ENV`
    /// - `PLANBOARD_GENERATION_TIMEOUT_SECS`: default 60
    /// - `PLANBOARD_GENERATION_RETRIES`: default 2
    /// - `PLANBOARD_GENERATION_RETRY_DELAY_MS`: default 800
    pub fn from_env() -> Result<Self, ConfigError> {
        let functions_url =
            required_url("PLANBOARD_FUNCTIONS_URL").or_else(|_| required_url("PLANBOARD_BACKEND_URL"))?;
        Ok(Self {
            functions_url,
            api_key: api_key_from_env()?,
            connect_secs: env_parse("PLANBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            timeout_secs: env_parse("PLANBOARD_GENERATION_TIMEOUT_SECS", DEFAULT_GENERATION_TIMEOUT_SECS),
            retries: env_parse("PLANBOARD_GENERATION_RETRIES", DEFAULT_GENERATION_RETRIES),
            retry_delay_ms: env_parse("PLANBOARD_GENERATION_RETRY_DELAY_MS", DEFAULT_GENERATION_RETRY_DELAY_MS),
        })
    }

    /// Config pointing at `functions_url` with default tuning.
    pub fn new(functions_url: impl Into<String>) -> Self {
        Self {
            functions_url: functions_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            retries: DEFAULT_GENERATION_RETRIES,
            retry_delay_ms: DEFAULT_GENERATION_RETRY_DELAY_MS,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// =============================================================================
// AUTOSAVE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Quiet period after the last change before saving.
    pub delay_ms: u64,
    /// How long `Saved` shows before returning to `Idle`.
    pub saved_reset_ms: u64,
    /// How long `Error` shows before returning to `Idle`.
    pub error_reset_ms: u64,
}

impl AutosaveConfig {
    /// Defaults for `surface`, without reading the environment.
    #[must_use]
    pub fn for_surface(surface: Surface) -> Self {
        Self {
            delay_ms: surface.autosave_delay_ms(),
            saved_reset_ms: DEFAULT_SAVED_RESET_MS,
            error_reset_ms: DEFAULT_ERROR_RESET_MS,
        }
    }

    /// Optional: `PLANBOARD_AUTOSAVE_MS` overrides the per-surface delay.
    #[must_use]
    pub fn from_env(surface: Surface) -> Self {
        let defaults = Self::for_surface(surface);
        Self { delay_ms: env_parse("PLANBOARD_AUTOSAVE_MS", defaults.delay_ms), ..defaults }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    #[must_use]
    pub fn saved_reset(&self) -> Duration {
        Duration::from_millis(self.saved_reset_ms)
    }

    #[must_use]
    pub fn error_reset(&self) -> Duration {
        Duration::from_millis(self.error_reset_ms)
    }
}

// =============================================================================
// EXPORT
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub scale: f32,
    pub background: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { scale: DEFAULT_EXPORT_SCALE, background: DEFAULT_EXPORT_BACKGROUND.to_string() }
    }
}

impl ExportConfig {
    /// Optional: `PLANBOARD_EXPORT_SCALE` (default 2), `PLANBOARD_EXPORT_BACKGROUND` (default `#ffffff`).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            scale: env_parse("PLANBOARD_EXPORT_SCALE", DEFAULT_EXPORT_SCALE),
            background: std::env::var("PLANBOARD_EXPORT_BACKGROUND")
                .unwrap_or_else(|_| DEFAULT_EXPORT_BACKGROUND.to_string()),
        }
    }
}

// =============================================================================
// APP
// =============================================================================

/// Everything the binary needs. Remote services are `None` when their URL is unset.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend: Option<BackendConfig>,
    pub generation: Option<GenerationConfig>,
    pub autosave: AutosaveConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn from_env(surface: Surface) -> Result<Self, ConfigError> {
        Ok(Self {
            backend: optional(BackendConfig::from_env())?,
            generation: optional(GenerationConfig::from_env())?,
            autosave: AutosaveConfig::from_env(surface),
            export: ExportConfig::from_env(),
        })
    }
}

/// An unset URL disables the service; any other error is fatal.
fn optional<T>(result: Result<T, ConfigError>) -> Result<Option<T>, ConfigError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::MissingVar { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn required_url(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().trim_end_matches('/').to_string()),
        _ => Err(ConfigError::MissingVar { var: key.to_string() }),
    }
}

fn api_key_from_env() -> Result<Option<String>, ConfigError> {
    let Ok(key_var) = std::env::var("PLANBOARD_API_KEY_ENV") else {
        return Ok(None);
    };
    std::env::var(&key_var)
        .map(Some)
        .map_err(|_| ConfigError::MissingApiKey { var: key_var.clone() })
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
