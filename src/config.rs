use std::path::PathBuf;
use std::time::Duration;

use envconfig::Envconfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Env(#[from] envconfig::Error),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Envconfig, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    #[envconfig(default = "https://www.mql5.com/en/job/rss")]
    pub rss_url: String,
    #[envconfig(default = "last_seen.txt")]
    pub last_seen_file: PathBuf,
    #[envconfig(default = "https://api.telegram.org")]
    pub telegram_api_url: String,
    #[envconfig(default = "20")]
    pub feed_timeout_secs: u64,
    #[envconfig(default = "15")]
    pub notify_timeout_secs: u64,
    #[envconfig(default = "jobwatch/0.1 (+rss notifier)")]
    pub user_agent: String,
    #[envconfig(default = "🚨 New MQL5 Job:")]
    pub message_header: String,
    /// 0 leaves the summary out of the message.
    #[envconfig(default = "0")]
    pub summary_max_chars: usize,
}

impl Config {
    /// Reads the process environment once and rejects blank credentials.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::init_from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Empty("TELEGRAM_BOT_TOKEN"));
        }
        if self.telegram_chat_id.trim().is_empty() {
            return Err(ConfigError::Empty("TELEGRAM_CHAT_ID"));
        }
        Ok(())
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

// Tokens end up in the request URL; keep them out of debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("rss_url", &self.rss_url)
            .field("last_seen_file", &self.last_seen_file)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("feed_timeout_secs", &self.feed_timeout_secs)
            .field("notify_timeout_secs", &self.notify_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("message_header", &self.message_header)
            .field("summary_max_chars", &self.summary_max_chars)
            .finish()
    }
}
