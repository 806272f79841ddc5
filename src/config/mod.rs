//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `SCHOLAR_LENS_*` environment variables (nested keys use `__`, e.g.
//! `SCHOLAR_LENS_PROVIDER__MODEL=gemini-2.5-pro`).
//!
//! The provider credential is resolved once, when the provider is built. A
//! missing key is a fatal [`ConfigError::MissingApiKey`]; the assistant is
//! never constructed without one.

pub mod file_config;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::research::JoinPolicy;
use crate::utils::RetryConfig;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SCHOLAR_LENS";

/// File name looked up in the working directory and the platform config dir
pub const CONFIG_FILE_NAME: &str = "scholar-lens.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which transport carries provider calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Call the provider API directly
    #[default]
    Gemini,
    /// Call an internal endpoint that forwards to the provider
    Relay,
}

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    /// API key; takes precedence over `api_key_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Endpoint used when `kind = "relay"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,

    /// HTTP timeout per request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            relay_url: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key from the config value or the configured env var
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
            .ok_or_else(|| ConfigError::MissingApiKey {
                env: self.api_key_env.clone(),
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.2
}

/// Retry settings for provider calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Optional per-attempt timeout, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_timeout_secs: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            attempt_timeout_secs: None,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            attempt_timeout: self.attempt_timeout_secs.map(Duration::from_secs),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

/// Settings for the multi-request analysis fan-out
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub join_policy: JoinPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"json"` for structured output, anything else for human-readable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No provider API key configured: set {env} or provider.api_key")]
    MissingApiKey { env: String },

    #[error("provider.kind is \"relay\" but provider.relay_url is not set")]
    MissingRelayUrl,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Find a config file in the working directory or the platform config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("scholar-lens").join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}

/// Get the default configuration
pub fn get_config() -> Config {
    Config::default()
}
