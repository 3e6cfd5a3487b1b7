use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_posts_url")]
    pub posts_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            posts_url: default_posts_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `compact` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_posts_url() -> String { "https://jsonplaceholder.typicode.com/posts".to_string() }
fn default_connect_timeout() -> u64 { 5 }
fn default_request_timeout() -> u64 { 30 }
fn default_debounce_ms() -> u64 { 500 }
fn default_log_format() -> String { "compact".to_string() }

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

/// Environment lookup used for overrides; tests substitute a fixed map.
fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl AppConfig {
    /// Load from `CONFIG_PATH` (default `config.toml`), apply env overrides and validate.
    pub fn load_or_default() -> Result<Self> {
        Self::load_from_path_or_default(&config_path(), process_env)
    }

    /// A missing file yields defaults; a file that exists and fails to parse is an error.
    pub fn load_from_path_or_default(
        path: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut cfg = if std::path::Path::new(path).exists() {
            load_from_file(path).map_err(|e| anyhow!("{path}: {e}"))?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate(env)?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.api.normalize_from_env(&env);
        self.api.validate()?;
        self.search.normalize_from_env(&env)?;
        self.search.validate()?;
        self.logging.normalize();
        Ok(())
    }
}

impl ApiConfig {
    /// `POSTS_API_URL` replaces the configured URL unless it is blank.
    pub fn normalize_from_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env("POSTS_API_URL") {
            if !url.trim().is_empty() {
                self.posts_url = url;
            }
        }
        self.posts_url = self.posts_url.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.posts_url.is_empty() {
            return Err(anyhow!("api.posts_url is empty; set it in config.toml or POSTS_API_URL"));
        }
        let lower = self.posts_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.posts_url must start with http:// or https://"));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(anyhow!("api timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SearchConfig {
    /// `SEARCH_DEBOUNCE_MS` replaces the configured quiet period; a non-numeric value is an error.
    pub fn normalize_from_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        let Some(raw) = env("SEARCH_DEBOUNCE_MS") else {
            return Ok(());
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        self.debounce_ms = raw
            .parse::<u64>()
            .map_err(|e| anyhow!("SEARCH_DEBOUNCE_MS must be whole milliseconds, got {raw:?}: {e}"))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(anyhow!("search.debounce_ms must be >= 1"));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        let format = self.format.trim().to_lowercase();
        self.format = if format == "json" { format } else { "compact".to_string() };
    }
}
