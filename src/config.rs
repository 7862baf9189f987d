//! Configuration management for SmartRead using the prefer crate.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::navigation::{NavigationTiming, DEFAULT_SETTLE_DELAY, DEFAULT_SPINNER_DELAY};
use crate::ocr::OcrConfig;

/// Environment variable overriding the backend URL.
pub const ENV_BACKEND_URL: &str = "SMARTREAD_BACKEND_URL";
/// Environment variable holding the OCR provider key.
pub const ENV_MISTRAL_API_KEY: &str = "MISTRAL_API_KEY";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Extraction backend base URL.
    pub backend_url: String,
    /// SQLite file holding the document session.
    pub cache_path: PathBuf,
    /// User agent for HTTP requests (None = default).
    pub user_agent: Option<String>,
    /// Request timeout in seconds (None = wait indefinitely).
    pub request_timeout: Option<u64>,
    /// Cooldown after a page change, in milliseconds.
    pub settle_delay_ms: u64,
    /// Pending time before the page spinner shows, in milliseconds.
    pub spinner_delay_ms: u64,
    /// OCR provider.
    pub ocr: OcrConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/.local/share/smartread/ (platform data dir)
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("smartread");

        Self {
            backend_url: "http://localhost:8000".to_string(),
            cache_path: data_dir.join("session.db"),
            user_agent: None,
            request_timeout: None,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            spinner_delay_ms: DEFAULT_SPINNER_DELAY.as_millis() as u64,
            ocr: OcrConfig::default(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_secs)
    }

    pub fn navigation_timing(&self) -> NavigationTiming {
        NavigationTiming {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            spinner_delay: Duration::from_millis(self.spinner_delay_ms),
        }
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
        if let Some(url) = set(lookup(ENV_BACKEND_URL)) {
            self.backend_url = url.trim().to_string();
        }
        if let Some(key) = set(lookup(ENV_MISTRAL_API_KEY)) {
            self.ocr.api_key = Some(key.trim().to_string());
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend_url: Option<String>,
    /// Path to the session cache; `~` is expanded.
    #[serde(default)]
    pub cache_path: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    #[serde(default)]
    pub settle_delay_ms: Option<u64>,
    #[serde(default)]
    pub spinner_delay_ms: Option<u64>,
    #[serde(default)]
    pub ocr: OcrSection,
}

/// `ocr.*` keys; each one overrides the matching [`OcrConfig`] field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrSection {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl OcrSection {
    fn apply_to(&self, ocr: &mut OcrConfig) {
        if let Some(ref endpoint) = self.endpoint {
            *ocr = ocr.clone().with_endpoint(endpoint);
        }
        if let Some(ref model) = self.model {
            ocr.model = model.clone();
        }
        if let Some(ref api_key) = self.api_key {
            ocr.api_key = Some(api_key.clone());
        }
    }
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers smartread config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("smartread").await {
            Ok(pref_config) => Self::from_prefer(&pref_config),
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Read the known keys from a loaded prefer config; missing or
    /// mistyped keys are left unset.
    pub fn from_prefer(pref_config: &prefer::Config) -> Self {
        // Extract values from prefer config using dot notation
        let backend_url: Option<String> = pref_config.get("backend_url").ok();
        let cache_path: Option<String> = pref_config.get("cache_path").ok();
        let user_agent: Option<String> = pref_config.get("user_agent").ok();
        let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
        let settle_delay_ms: Option<u64> = pref_config.get("settle_delay_ms").ok();
        let spinner_delay_ms: Option<u64> = pref_config.get("spinner_delay_ms").ok();
        let ocr = OcrSection {
            endpoint: pref_config.get("ocr.endpoint").ok(),
            model: pref_config.get("ocr.model").ok(),
            api_key: pref_config.get("ocr.api_key").ok(),
        };

        Config {
            backend_url,
            cache_path,
            user_agent,
            request_timeout,
            settle_delay_ms,
            spinner_delay_ms,
            ocr,
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref url) = self.backend_url {
            settings.backend_url = url.clone();
        }
        if let Some(ref path) = self.cache_path {
            settings.cache_path = PathBuf::from(shellexpand::tilde(path).as_ref());
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = Some(timeout);
        }
        if let Some(delay) = self.settle_delay_ms {
            settings.settle_delay_ms = delay;
        }
        if let Some(delay) = self.spinner_delay_ms {
            settings.spinner_delay_ms = delay;
        }
        self.ocr.apply_to(&mut settings.ocr);
    }
}

/// Load settings from configuration, then the environment.
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings.apply_env(|key| std::env::var(key).ok());
    settings
}
