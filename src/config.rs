//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{DEFAULT_BASE_URL, LlmConfig};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Telegram connection settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Usernames or numeric ids; `*` allows everyone.
    pub allowed_users: Vec<String>,
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot name for identification in logs.
    pub name: String,
    pub llm: LlmConfig,
    /// Telegram is enabled only when a bot token is set.
    pub telegram: Option<TelegramConfig>,
    /// Whether to run the stdin/stdout channel.
    pub cli: bool,
    /// Session idle timeout (a user's state is dropped after this duration).
    pub session_idle_timeout: Duration,
    /// Directory for the daily rolling log file, if any.
    pub log_dir: Option<PathBuf>,
}

impl BotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let llm = LlmConfig {
            api_key: SecretString::from(api_key),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            organization: get("OPENAI_ORGANIZATION"),
            timeout: Duration::from_secs(parse_secs(
                "PEB_LLM_TIMEOUT_SECS",
                get("PEB_LLM_TIMEOUT_SECS"),
                60,
            )?),
        };

        let telegram = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("TELEGRAM_TOKEN"))
            .map(|bot_token| TelegramConfig {
                bot_token,
                allowed_users: get("TELEGRAM_ALLOWED_USERS")
                    .unwrap_or_else(|| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            });

        let cli = match get("PEB_CLI") {
            Some(v) => parse_bool("PEB_CLI", &v)?,
            None => telegram.is_none(),
        };

        let session_idle_timeout = Duration::from_secs(parse_secs(
            "PEB_SESSION_IDLE_SECS",
            get("PEB_SESSION_IDLE_SECS"),
            3600, // 1 hour
        )?);

        Ok(Self {
            name: "prompt-enhancer-bot".to_string(),
            llm,
            telegram,
            cli,
            session_idle_timeout,
            log_dir: get("PEB_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
