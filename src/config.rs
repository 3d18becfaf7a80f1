use crate::error::Result;
use config::Config;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Connection timeout in seconds
    pub connect_timeout_secs: Option<u64>,
    /// User agent string
    pub user_agent: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RetryConfig {
    /// Initial backoff delay in seconds
    pub base_delay_secs: Option<u64>,
    /// Backoff delay ceiling in seconds
    pub max_delay_secs: Option<u64>,
    /// Total retry budget in seconds; once spent, the last error surfaces
    pub budget_secs: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Cfg {
    /// The directory to download posts to
    pub download_dir: Option<String>,
    /// Filename prefix for downloaded images and metadata files
    pub file_prefix: Option<String>,
    /// The base URL of the booru (defaults to https://www.sakugabooru.com)
    pub base_url: Option<String>,
    /// HTTP client configuration
    pub http: Option<HttpConfig>,
    /// Retry/backoff configuration
    pub retry: Option<RetryConfig>,
}

impl Default for Cfg {
    fn default() -> Self {
        Self {
            download_dir: Some("downloads".to_string()),
            file_prefix: Some("sankaku".to_string()),
            base_url: Some("https://www.sakugabooru.com".to_string()),
            http: Some(HttpConfig::default()),
            retry: Some(RetryConfig::default()),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Some(10),
            connect_timeout_secs: Some(10),
            user_agent: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: Some(1),
            max_delay_secs: Some(5),
            budget_secs: Some(20),
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs.unwrap_or(1))
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs.unwrap_or(5))
    }

    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs.unwrap_or(20))
    }
}

impl Cfg {
    pub fn get() -> Result<Self> {
        let config_path = "sakuga-dl.toml";
        let settings = Config::builder()
            .add_source(config::File::with_name("sakuga-dl").required(false))
            .add_source(config::Environment::with_prefix("SAKUGA_DL"))
            .build()?;

        let mut cfg = settings
            .try_deserialize::<Cfg>()
            .unwrap_or_else(|_| Cfg::default());

        if cfg.http.is_none() {
            cfg.http = Some(HttpConfig::default());
        }

        if cfg.retry.is_none() {
            cfg.retry = Some(RetryConfig::default());
        }

        if !Path::new(config_path).exists() {
            log::info!("Creating default configuration file at {}", config_path);
            if let Err(e) = cfg.save_to_file(config_path) {
                log::warn!("Failed to create default config file: {}", e);
            }
        }

        Ok(cfg)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str)?;
        Ok(())
    }
}
