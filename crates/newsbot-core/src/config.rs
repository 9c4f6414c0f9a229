use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_OPENAI_API_KEY: &str = "NEWSBOT_OPENAI_API_KEY";
const ENV_TELEGRAM_BOT_TOKEN: &str = "NEWSBOT_TELEGRAM_BOT_TOKEN";
const ENV_TELEGRAM_CHANNEL_ID: &str = "NEWSBOT_TELEGRAM_CHANNEL_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between fetch ticks in seconds
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_secs: u64,
    /// Interval between notification ticks in seconds
    #[serde(default = "default_notification_interval")]
    pub notification_interval_secs: u64,
    /// Trailing window for article selection; defaults to twice the fetch interval
    #[serde(default)]
    pub lookup_window_secs: Option<u64>,
    /// Feed request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Article page request timeout in seconds
    #[serde(default = "default_content_timeout")]
    pub content_timeout_secs: u64,
    /// HTTP proxy URL for outbound requests (e.g., "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_interval_secs: default_fetch_interval(),
            notification_interval_secs: default_notification_interval(),
            lookup_window_secs: None,
            request_timeout_secs: default_timeout(),
            content_timeout_secs: default_content_timeout(),
            proxy_url: None,
        }
    }
}

impl SyncConfig {
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    pub fn notification_interval(&self) -> Duration {
        Duration::from_secs(self.notification_interval_secs)
    }

    /// Window sized so that no freshly fetched article falls outside it
    pub fn lookup_window(&self) -> Duration {
        Duration::from_secs(
            self.lookup_window_secs
                .unwrap_or_else(|| self.fetch_interval_secs.saturating_mul(2)),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Items matching any keyword (category or title substring) are dropped
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Override for OpenAI-compatible endpoints
    #[serde(default)]
    pub openai_api_base: Option<String>,
    /// System prompt sent with every summarization request
    #[serde(default)]
    pub prompt: String,
    /// Max tokens for a summary
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_api_base: None,
            prompt: String::new(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Destination channel ID
    #[serde(default)]
    pub channel_id: Option<i64>,
    /// Bot API base URL
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            api_base: default_telegram_api_base(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsbot")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fetch_interval() -> u64 {
    600 // 10 minutes
}

fn default_notification_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

fn default_content_timeout() -> u64 {
    10
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, then apply environment overrides
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_OPENAI_API_KEY) {
            self.ai.openai_api_key = Some(key);
        }
        if let Some(token) = lookup(ENV_TELEGRAM_BOT_TOKEN) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(id) = lookup(ENV_TELEGRAM_CHANNEL_ID) {
            let id = id.trim().parse::<i64>().map_err(|e| {
                crate::Error::Config(format!("{} is not a valid channel ID: {}", ENV_TELEGRAM_CHANNEL_ID, e))
            })?;
            self.telegram.channel_id = Some(id);
        }
        Ok(())
    }

    /// Check that everything the schedulers need is present
    pub fn validate_for_daemon(&self) -> crate::Result<()> {
        let missing = |what: &str| crate::Error::Config(format!("{} not configured", what));

        if self.ai.openai_api_key.as_deref().map_or(true, str::is_empty) {
            return Err(missing("OpenAI API key"));
        }
        if self.ai.prompt.trim().is_empty() {
            return Err(missing("Summarization prompt"));
        }
        if self.telegram.bot_token.as_deref().map_or(true, str::is_empty) {
            return Err(missing("Telegram bot token"));
        }
        if self.telegram.channel_id.is_none() {
            return Err(missing("Telegram channel ID"));
        }
        if self.sync.fetch_interval_secs == 0 || self.sync.notification_interval_secs == 0 {
            return Err(crate::Error::Config(
                "Scheduler intervals must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/newsbot/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("newsbot")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("newsbot.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}
