//! Configuration management for `TripMazer`
//!
//! Settings are layered: built-in defaults, an optional TOML file, then
//! `TRIPMAZER_*` environment variables (`__` separates nested keys, e.g.
//! `TRIPMAZER_SERVER__PORT=9000`). Provider keys additionally fall back to
//! the conventional `PERPLEXITY_API_KEY`, `SERP_API_KEY` and
//! `GEMINI_API_KEY` variables.

use crate::TripMazerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripMazerConfig {
    #[serde(default)]
    pub perplexity: PerplexityConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub serp: SerpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// Perplexity chat completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerplexityConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_perplexity_base_url")]
    pub base_url: String,
    /// Model used for planning prompts
    #[serde(default = "default_perplexity_model")]
    pub model: String,
    /// Model used by the connectivity check
    #[serde(default = "default_perplexity_check_model")]
    pub check_model: String,
    #[serde(default = "default_search_context_size")]
    pub search_context_size: String,
    #[serde(default = "default_perplexity_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Gemini settings, used for airport code resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// SerpAPI settings for hotel and flight search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_serp_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP collector endpoint; traces are exported only when set
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reported by the health endpoint
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    #[serde(default = "default_body_limit")]
    pub body_limit_kb: usize,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

/// Budget split and spend estimation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Budget assumed when the request names none
    #[serde(default = "default_budget")]
    pub default_budget: f64,
    /// Share added to the first tool of the routing order
    #[serde(default = "default_first_tool_bonus")]
    pub first_tool_bonus: f64,
    /// Lowest share any tool can be reduced to
    #[serde(default = "default_min_share")]
    pub min_share: f64,
    /// Fraction of a category's remaining budget booked after its tool runs
    #[serde(default = "default_spend_ratio")]
    pub spend_ratio: f64,
}

fn default_perplexity_base_url() -> String {
    "https://api.perplexity.ai".to_string()
}

fn default_perplexity_model() -> String {
    "sonar".to_string()
}

fn default_perplexity_check_model() -> String {
    "sonar-pro".to_string()
}

fn default_search_context_size() -> String {
    "medium".to_string()
}

fn default_perplexity_timeout() -> u32 {
    45
}

fn default_provider_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_serp_base_url() -> String {
    "https://serpapi.com".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_location() -> String {
    "~/.cache/tripmazer".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_service_name() -> String {
    "tripmazer".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_request_timeout() -> u32 {
    300
}

fn default_body_limit() -> usize {
    64
}

fn default_budget() -> f64 {
    10000.0
}

fn default_first_tool_bonus() -> f64 {
    0.10
}

fn default_min_share() -> f64 {
    0.05
}

fn default_spend_ratio() -> f64 {
    0.8
}

impl Default for PerplexityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_perplexity_base_url(),
            model: default_perplexity_model(),
            check_model: default_perplexity_check_model(),
            search_context_size: default_search_context_size(),
            timeout_seconds: default_perplexity_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            timeout_seconds: default_provider_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for SerpConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_serp_base_url(),
            timeout_seconds: default_provider_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            request_timeout_seconds: default_request_timeout(),
            body_limit_kb: default_body_limit(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_budget: default_budget(),
            first_tool_bonus: default_first_tool_bonus(),
            min_share: default_min_share(),
            spend_ratio: default_spend_ratio(),
        }
    }
}

impl CacheConfig {
    /// Cache directory with a leading `~` expanded to the home directory
    #[must_use]
    pub fn resolved_location(&self) -> PathBuf {
        match self.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(rest)),
            None => PathBuf::from(&self.location),
        }
    }
}

impl TripMazerConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("TRIPMAZER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripMazerConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        config.apply_env_fallbacks();
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripmazer").join("config.toml"))
    }

    /// Fill missing provider keys from the conventional variable names
    pub fn apply_env_fallbacks(&mut self) {
        fn fallback(slot: &mut Option<String>, var: &str) {
            if slot.is_none() {
                *slot = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            }
        }
        fallback(&mut self.perplexity.api_key, "PERPLEXITY_API_KEY");
        fallback(&mut self.serp.api_key, "SERP_API_KEY");
        fallback(&mut self.gemini.api_key, "GEMINI_API_KEY");
    }

    /// Apply default values to empty or zeroed fields
    pub fn apply_defaults(&mut self) {
        if self.perplexity.base_url.is_empty() {
            self.perplexity.base_url = default_perplexity_base_url();
        }
        if self.perplexity.model.is_empty() {
            self.perplexity.model = default_perplexity_model();
        }
        if self.perplexity.timeout_seconds == 0 {
            self.perplexity.timeout_seconds = default_perplexity_timeout();
        }
        if self.gemini.base_url.is_empty() {
            self.gemini.base_url = default_gemini_base_url();
        }
        if self.gemini.model.is_empty() {
            self.gemini.model = default_gemini_model();
        }
        if self.gemini.timeout_seconds == 0 {
            self.gemini.timeout_seconds = default_provider_timeout();
        }
        if self.serp.base_url.is_empty() {
            self.serp.base_url = default_serp_base_url();
        }
        if self.serp.timeout_seconds == 0 {
            self.serp.timeout_seconds = default_provider_timeout();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.planner.default_budget <= 0.0 {
            self.planner.default_budget = default_budget();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Keys are optional at load time; when present they must look plausible
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Perplexity", &self.perplexity.api_key),
            ("SerpAPI", &self.serp.api_key),
            ("Gemini", &self.gemini.api_key),
        ];

        for (provider, key) in keys {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(TripMazerError::config(format!(
                        "{provider} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }
                if key.len() < 8 {
                    return Err(TripMazerError::config(format!(
                        "{provider} API key appears to be invalid (too short). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Perplexity", self.perplexity.timeout_seconds),
            ("Gemini", self.gemini.timeout_seconds),
            ("SerpAPI", self.serp.timeout_seconds),
        ];
        for (provider, timeout) in timeouts {
            if timeout > 300 {
                return Err(TripMazerError::config(format!(
                    "{provider} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        let retries = [
            ("Perplexity", self.perplexity.max_retries),
            ("Gemini", self.gemini.max_retries),
            ("SerpAPI", self.serp.max_retries),
        ];
        for (provider, max_retries) in retries {
            if max_retries > 10 {
                return Err(TripMazerError::config(format!(
                    "{provider} max retries cannot exceed 10"
                ))
                .into());
            }
        }

        if self.cache.ttl_seconds > 7 * 24 * 3600 {
            return Err(TripMazerError::config("Cache TTL cannot exceed one week").into());
        }

        if self.server.request_timeout_seconds > 3600 {
            return Err(TripMazerError::config("Request timeout cannot exceed 3600 seconds").into());
        }

        if !(0.0..=0.5).contains(&self.planner.first_tool_bonus) {
            return Err(TripMazerError::config("First tool bonus must be between 0.0 and 0.5").into());
        }

        if !(0.0..=0.25).contains(&self.planner.min_share) {
            return Err(TripMazerError::config("Minimum share must be between 0.0 and 0.25").into());
        }

        if self.planner.spend_ratio <= 0.0 || self.planner.spend_ratio > 1.0 {
            return Err(TripMazerError::config("Spend ratio must be in (0.0, 1.0]").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripMazerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripMazerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Perplexity", &self.perplexity.base_url),
            ("Gemini", &self.gemini.base_url),
            ("SerpAPI", &self.serp.base_url),
        ];
        for (provider, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripMazerError::config(format!(
                    "{provider} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Create configuration directory if it doesn't exist
    pub fn ensure_config_dir() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let dir = config_dir.join("tripmazer");
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
            Ok(dir)
        } else {
            Err(TripMazerError::config("Unable to determine config directory").into())
        }
    }
}
