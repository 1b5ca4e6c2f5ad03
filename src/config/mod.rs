use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, ScrapingError};
use crate::scraper::Transport;

/// Prefix for environment overrides, e.g. `PRICE_SCRAPER__HTTP__TIMEOUT=5s`.
pub const ENV_PREFIX: &str = "PRICE_SCRAPER";

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub browser: RenderConfig,
    #[serde(default)]
    pub scrapers: ScrapersConfig,
}

/// Static transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
}

/// Rendered transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    #[serde(with = "humantime_serde")]
    pub navigation_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub selector_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub user_agent: String,
    pub max_concurrent_sessions: usize,
    pub window: WindowSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapersConfig {
    /// Which Shopee variant gets registered.
    pub shopee_transport: Transport,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            selector_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(250),
            headless: true,
            executable: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrent_sessions: 4,
            window: WindowSize {
                width: 1920,
                height: 1080,
            },
        }
    }
}

impl Default for ScrapersConfig {
    fn default() -> Self {
        Self {
            shopee_transport: Transport::Rendered,
        }
    }
}

#[async_trait::async_trait]
pub trait ConfigManager {
    async fn load_config(&self) -> Result<Config>;
    async fn save_config(&self, config: &Config) -> Result<()>;
    fn validate_config(&self, config: &Config) -> Result<()>;
}

pub struct FileConfigManager {
    config_path: PathBuf,
    /// Replaces the process environment as the override layer when set.
    env_vars: Option<::config::Map<String, String>>,
}

impl FileConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            env_vars: None,
        }
    }

    pub fn with_env_vars(mut self, vars: ::config::Map<String, String>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    fn env_source(&self) -> ::config::Environment {
        ::config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(self.env_vars.clone())
    }
}

#[async_trait::async_trait]
impl ConfigManager for FileConfigManager {
    async fn load_config(&self) -> Result<Config> {
        info!("Loading configuration from {:?}", self.config_path);

        // check if config file exists, create default if not
        if !self.config_path.exists() {
            warn!("Configuration file not found, creating default config at {:?}", self.config_path);
            self.create_default_config().await?;
        }

        // file first, environment on top
        let layered = ::config::Config::builder()
            .add_source(
                ::config::File::from(self.config_path.clone()).format(::config::FileFormat::Toml),
            )
            .add_source(self.env_source())
            .build()
            .map_err(ScrapingError::from)?;

        let config: Config = layered.try_deserialize().map_err(ScrapingError::from)?;

        self.validate_config(&config)?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    fn validate_config(&self, config: &Config) -> Result<()> {
        debug!("Validating configuration");

        if config.http.timeout.is_zero() {
            return Err(ScrapingError::ConfigError("http.timeout must be greater than 0".to_string()).into());
        }
        if config.http.user_agent.trim().is_empty() {
            return Err(ScrapingError::ConfigError("http.user_agent cannot be empty".to_string()).into());
        }

        let browser = &config.browser;
        if browser.navigation_timeout.is_zero() || browser.selector_timeout.is_zero() {
            return Err(ScrapingError::ConfigError("browser timeouts must be greater than 0".to_string()).into());
        }
        if browser.selector_timeout > browser.navigation_timeout {
            return Err(ScrapingError::ConfigError(
                "browser.selector_timeout cannot exceed browser.navigation_timeout".to_string(),
            )
            .into());
        }
        if browser.poll_interval.is_zero() || browser.poll_interval > browser.selector_timeout {
            return Err(ScrapingError::ConfigError(
                "browser.poll_interval must be between 0 and browser.selector_timeout".to_string(),
            )
            .into());
        }
        if browser.max_concurrent_sessions == 0 {
            return Err(ScrapingError::ConfigError("max_concurrent_sessions must be greater than 0".to_string()).into());
        }
        if browser.max_concurrent_sessions > 32 {
            return Err(ScrapingError::ConfigError(
                "max_concurrent_sessions cannot exceed 32 for resource safety".to_string(),
            )
            .into());
        }
        if browser.user_agent.trim().is_empty() {
            return Err(ScrapingError::ConfigError("browser.user_agent cannot be empty".to_string()).into());
        }
        if browser.window.width == 0 || browser.window.height == 0 {
            return Err(ScrapingError::ConfigError("browser.window must be non-empty".to_string()).into());
        }

        if let Some(ref executable) = browser.executable {
            if !executable.exists() {
                return Err(ScrapingError::ConfigError(format!("Browser executable not found: {:?}", executable)).into());
            }
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    async fn save_config(&self, config: &Config) -> Result<()> {
        info!("Saving configuration to {:?}", self.config_path);

        let toml_content = toml::to_string_pretty(config).map_err(ScrapingError::from)?;

        fs::write(&self.config_path, toml_content)
            .map_err(|e| ScrapingError::ConfigError(format!("Failed to write config file: {}", e)))?;

        info!("Configuration saved successfully");
        Ok(())
    }
}

impl FileConfigManager {
    /// Create a default configuration file
    async fn create_default_config(&self) -> Result<()> {
        let toml_content = toml::to_string_pretty(&Config::default()).map_err(ScrapingError::from)?;

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ScrapingError::ConfigError(format!("Failed to create config directory: {}", e)))?;
            }
        }

        fs::write(&self.config_path, toml_content)
            .map_err(|e| ScrapingError::ConfigError(format!("Failed to write default config: {}", e)))?;

        info!("Default configuration file created at {:?}", self.config_path);
        Ok(())
    }
}
