//! Configuration loading, validation, and management for ThinkFirst.
//!
//! Loads configuration from `~/.thinkfirst/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.thinkfirst/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Classifier and pipeline tuning
    #[serde(default)]
    pub tutor: TutorConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Weather and news sources
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Code execution for `POST /api/execute`
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("tutor", &self.tutor)
            .field("gateway", &self.gateway)
            .field("realtime", &self.realtime)
            .field("runner", &self.runner)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("units", &self.units)
            .field("default_location", &self.default_location)
            .finish()
    }
}

impl std::fmt::Debug for NewsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("country", &self.country)
            .field("max_headlines", &self.max_headlines)
            .finish()
    }
}

/// Thresholds used by the context classifier and the turn pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// A learning-mode reply longer than this many characters counts as an attempt
    #[serde(default = "default_substantive_min_chars")]
    pub substantive_min_chars: usize,

    /// How many history turns are replayed to the model
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_substantive_min_chars() -> usize {
    10
}
fn default_history_window() -> usize {
    10
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            substantive_min_chars: default_substantive_min_chars(),
            history_window: default_history_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins; `["*"]` allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".into(),
        "http://localhost:3000".into(),
        "https://think-first-ai.web.app".into(),
        "https://think-first-ai.firebaseapp.com".into(),
    ]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Limits for running user code.
///
/// Off by default: the gateway has no authentication, so enabling it lets
/// anyone who can reach the port run programs on the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Wall-clock limit for compiling and running one snippet
    #[serde(default = "default_runner_timeout")]
    pub timeout_secs: u64,

    /// Captured stdout and stderr are cut to this many bytes each
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_runner_timeout() -> u64 {
    10
}
fn default_max_output_bytes() -> usize {
    64 * 1024
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: default_runner_timeout(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub news: NewsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_weather_url")]
    pub base_url: String,

    /// "metric" or "imperial"
    #[serde(default = "default_units")]
    pub units: String,

    /// Used when the message names no place
    #[serde(default = "default_location")]
    pub default_location: String,
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5".into()
}
fn default_units() -> String {
    "metric".into()
}
fn default_location() -> String {
    "London".into()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_url(),
            units: default_units(),
            default_location: default_location(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_news_url")]
    pub base_url: String,

    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_max_headlines")]
    pub max_headlines: usize,
}

fn default_news_url() -> String {
    "https://newsapi.org/v2".into()
}
fn default_country() -> String {
    "us".into()
}
fn default_max_headlines() -> usize {
    5
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_news_url(),
            country: default_country(),
            max_headlines: default_max_headlines(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.thinkfirst/config.toml).
    ///
    /// Environment variables then override the file:
    /// - `THINKFIRST_API_KEY`, `GROQ_API_KEY`, `OPENAI_API_KEY` (first found, only if unset)
    /// - `THINKFIRST_PROVIDER`, `THINKFIRST_MODEL`, `PORT`
    /// - `OPENWEATHER_API_KEY`, `NEWS_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (a `std::env::var` stand-in).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("THINKFIRST_API_KEY")
                .or_else(|| lookup("GROQ_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("THINKFIRST_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("THINKFIRST_MODEL") {
            self.default_model = model;
        }

        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
            }
        }

        if self.realtime.weather.api_key.is_none() {
            self.realtime.weather.api_key = lookup("OPENWEATHER_API_KEY");
        }

        if self.realtime.news.api_key.is_none() {
            self.realtime.news.api_key = lookup("NEWS_API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".thinkfirst")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.tutor.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "tutor.history_window must be at least 1".into(),
            ));
        }

        if self.runner.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "runner.timeout_secs must be at least 1".into(),
            ));
        }

        if !matches!(self.realtime.weather.units.as_str(), "metric" | "imperial") {
            return Err(ConfigError::ValidationError(format!(
                "realtime.weather.units must be \"metric\" or \"imperial\", got \"{}\"",
                self.realtime.weather.units
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            tutor: TutorConfig::default(),
            gateway: GatewayConfig::default(),
            realtime: RealtimeConfig::default(),
            runner: RunnerConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "groq");
        assert_eq!(config.default_model, "llama-3.3-70b-versatile");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.tutor.substantive_min_chars, 10);
        assert_eq!(config.tutor.history_window, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.allowed_origins, config.gateway.allowed_origins);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_history_window_rejected() {
        let mut config = AppConfig::default();
        config.tutor.history_window = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn runner_is_off_by_default() {
        let config = AppConfig::default();
        assert!(!config.runner.enabled);
        assert_eq!(config.runner.timeout_secs, 10);

        let mut config = AppConfig::default();
        config.runner.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "groq");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "llama-3.1-8b-instant"

[tutor]
substantive_min_chars = 25

[realtime.weather]
units = "imperial"

[runner]
enabled = true
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "llama-3.1-8b-instant");
        assert_eq!(config.tutor.substantive_min_chars, 25);
        assert_eq!(config.tutor.history_window, 10);
        assert_eq!(config.realtime.weather.units, "imperial");
        assert_eq!(config.realtime.news.country, "us");
        assert!(config.runner.enabled);
        assert_eq!(config.runner.timeout_secs, 10);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_temperature = \"hot\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(env_from(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("THINKFIRST_MODEL", "mixtral"),
            ("PORT", "9001"),
            ("NEWS_API_KEY", "news-key"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.default_model, "mixtral");
        assert_eq!(config.gateway.port, 9001);
        assert_eq!(config.realtime.news.api_key.as_deref(), Some("news-key"));
        assert!(config.realtime.weather.api_key.is_none());
    }

    #[test]
    fn env_does_not_replace_configured_key() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env_from(&[("THINKFIRST_API_KEY", "from-env"), ("PORT", "nope")]));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("gsk-secret".into()),
            ..AppConfig::default()
        };
        config.realtime.weather.api_key = Some("owm-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("gsk-secret"));
        assert!(!rendered.contains("owm-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("groq"));
        assert!(toml_str.contains("substantive_min_chars"));
    }
}
