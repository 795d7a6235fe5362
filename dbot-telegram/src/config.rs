//! 运行时配置：Telegram 接入、日志、轮询参数与命令解析策略。
//! 与外部交互：从环境变量加载，见 [`TelegramConfig::from_env`]。

use anyhow::Result;
use handler_chain::ParserOptions;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// 轮询循环参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// 每次拉取的 `limit`（POLL_BATCH_SIZE，1..=100）。
    pub batch_size: u32,
    /// 长轮询超时秒数（POLL_TIMEOUT_SECS）。
    pub poll_timeout_secs: u32,
    /// 早于该时长的消息视为过期并跳过（UPDATE_EXPIRATION_SECS）。
    pub update_expiration: Duration,
    /// 两次轮询之间的固定间隔（POLL_DELAY_MS）。
    pub cycle_delay: Duration,
    /// 连续拉取失败后退避间隔的上限（POLL_MAX_BACKOFF_SECS）。
    pub max_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_timeout_secs: 60,
            update_expiration: Duration::from_secs(2 * 60),
            cycle_delay: Duration::ZERO,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl PollConfig {
    /// 从环境变量加载；未设置或无法解析时使用默认值。
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: env_or("POLL_BATCH_SIZE", defaults.batch_size),
            poll_timeout_secs: env_or("POLL_TIMEOUT_SECS", defaults.poll_timeout_secs),
            update_expiration: env::var("UPDATE_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.update_expiration),
            cycle_delay: env::var("POLL_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.cycle_delay),
            max_backoff: env::var("POLL_MAX_BACKOFF_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_backoff),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > 100 {
            anyhow::bail!("POLL_BATCH_SIZE must be within 1..=100, got {}", self.batch_size);
        }
        if self.update_expiration.is_zero() {
            anyhow::bail!("UPDATE_EXPIRATION_SECS must be greater than zero");
        }
        Ok(())
    }
}

/// 完整运行时配置。
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL 或 TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE
    pub log_file: String,
    pub poll: PollConfig,
    /// COMMAND_CASE_INSENSITIVE
    pub command_case_insensitive: bool,
    /// BOT_USERNAME；未设置时启动阶段可通过 getMe 获取。
    pub bot_username: Option<String>,
}

impl TelegramConfig {
    pub const DEFAULT_LOG_FILE: &'static str = "logs/dbot.log";

    /// 从环境变量加载：`token` 若提供则覆盖 BOT_TOKEN，二者至少其一。
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| Self::DEFAULT_LOG_FILE.to_string());
        let command_case_insensitive = env_or("COMMAND_CASE_INSENSITIVE", true);
        let bot_username = env::var("BOT_USERNAME").ok().filter(|s| !s.is_empty());

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            poll: PollConfig::from_env(),
            command_case_insensitive,
            bot_username,
        })
    }

    /// 使用给定 token 构造，其余为默认值。
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            log_file: Self::DEFAULT_LOG_FILE.to_string(),
            poll: PollConfig::default(),
            command_case_insensitive: true,
            bot_username: None,
        }
    }

    /// 校验 token、API URL（若设置）与轮询参数。
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        self.poll.validate()
    }

    /// 由本配置得出的命令解析策略。
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            case_insensitive: self.command_case_insensitive,
            bot_username: self.bot_username.clone(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "BOT_TOKEN",
        "TELEGRAM_API_URL",
        "TELOXIDE_API_URL",
        "LOG_FILE",
        "POLL_BATCH_SIZE",
        "POLL_TIMEOUT_SECS",
        "UPDATE_EXPIRATION_SECS",
        "POLL_DELAY_MS",
        "POLL_MAX_BACKOFF_SECS",
        "COMMAND_CASE_INSENSITIVE",
        "BOT_USERNAME",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_with_token() {
        let config = TelegramConfig::with_token("test_token".to_string());
        assert_eq!(config.bot_token, "test_token");
        assert!(config.telegram_api_url.is_none());
        assert_eq!(config.poll, PollConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        env::set_var("BOT_TOKEN", "env_token");

        let config = TelegramConfig::from_env(None).unwrap();

        assert_eq!(config.bot_token, "env_token");
        assert_eq!(config.log_file, "logs/dbot.log");
        assert_eq!(config.poll.batch_size, 100);
        assert_eq!(config.poll.poll_timeout_secs, 60);
        assert_eq!(config.poll.update_expiration, Duration::from_secs(120));
        assert_eq!(config.poll.cycle_delay, Duration::ZERO);
        assert!(config.command_case_insensitive);
        assert!(config.bot_username.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_custom_values() {
        clear_env();
        env::set_var("BOT_TOKEN", "env_token");
        env::set_var("TELOXIDE_API_URL", "http://127.0.0.1:8081");
        env::set_var("POLL_BATCH_SIZE", "20");
        env::set_var("POLL_TIMEOUT_SECS", "5");
        env::set_var("UPDATE_EXPIRATION_SECS", "30");
        env::set_var("POLL_DELAY_MS", "250");
        env::set_var("COMMAND_CASE_INSENSITIVE", "false");
        env::set_var("BOT_USERNAME", "bumble_bot");

        let config = TelegramConfig::from_env(Some("override".to_string())).unwrap();

        assert_eq!(config.bot_token, "override");
        assert_eq!(config.telegram_api_url.as_deref(), Some("http://127.0.0.1:8081"));
        assert_eq!(config.poll.batch_size, 20);
        assert_eq!(config.poll.poll_timeout_secs, 5);
        assert_eq!(config.poll.update_expiration, Duration::from_secs(30));
        assert_eq!(config.poll.cycle_delay, Duration::from_millis(250));
        assert_eq!(
            config.parser_options(),
            ParserOptions {
                case_insensitive: false,
                bot_username: Some("bumble_bot".to_string()),
            }
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_requires_token() {
        clear_env();
        assert!(TelegramConfig::from_env(None).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TelegramConfig::with_token("t".to_string());
        config.telegram_api_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        let mut config = TelegramConfig::with_token("t".to_string());
        config.poll.batch_size = 0;
        assert!(config.validate().is_err());
        config.poll.batch_size = 101;
        assert!(config.validate().is_err());

        let mut config = TelegramConfig::with_token("t".to_string());
        config.poll.update_expiration = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
