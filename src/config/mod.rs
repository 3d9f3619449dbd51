use chrono::Duration;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

use crate::notify::recipients::ChannelKey;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Warning limit ({warning} min) must be shorter than overdue limit ({overdue} min)")]
    ThresholdOrder { warning: i64, overdue: i64 },
}

/// Immutable engine configuration, built once at startup from the
/// environment and passed explicitly into the sweeper and renderer.
#[derive(Debug, Clone)]
pub struct SlaConfig {
    /// Canonical timezone for all duration math and display formatting.
    pub timezone: Tz,
    /// Soft threshold: one-time warning after this much elapsed time.
    pub warning_limit: Duration,
    /// Hard threshold: orders transition to overdue after this.
    pub overdue_limit: Duration,
    pub bot_token: String,
    /// Broadcast chat every notification goes to.
    pub primary_chat_id: String,
    /// Per-managing-party chats; keys without an env var are absent.
    pub group_chat_ids: HashMap<ChannelKey, String>,
    /// Bound on each outbound Telegram request.
    pub send_timeout: std::time::Duration,
    /// Cadence of the periodic sweep daemon.
    pub sweep_interval: std::time::Duration,
}

impl SlaConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let timezone_name =
            env::var("SLA_TIMEZONE").unwrap_or_else(|_| "Asia/Jakarta".to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(timezone_name))?;

        let warning_minutes = env_i64("SLA_WARNING_MINUTES", 60)?;
        let overdue_minutes = env_i64("SLA_OVERDUE_MINUTES", 120)?;

        let bot_token =
            env::var("TELEGRAM_BOT_TOKEN").map_err(|_| ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let primary_chat_id =
            env::var("TELEGRAM_GROUP_ID").map_err(|_| ConfigError::Missing("TELEGRAM_GROUP_ID"))?;

        let mut group_chat_ids = HashMap::new();
        for key in ChannelKey::ALL {
            let var = format!("TELEGRAM_GROUP_ID_{}", key.env_suffix());
            if let Ok(chat_id) = env::var(&var) {
                if !chat_id.trim().is_empty() {
                    group_chat_ids.insert(key, chat_id);
                }
            }
        }

        let send_timeout_secs = env_i64("TELEGRAM_SEND_TIMEOUT_SECS", 10)?;
        let sweep_interval_secs = env_i64("SWEEP_INTERVAL_SECS", 300)?;

        Self {
            timezone,
            warning_limit: Duration::minutes(warning_minutes),
            overdue_limit: Duration::minutes(overdue_minutes),
            bot_token,
            primary_chat_id,
            group_chat_ids,
            send_timeout: std::time::Duration::from_secs(send_timeout_secs as u64),
            sweep_interval: std::time::Duration::from_secs(sweep_interval_secs as u64),
        }
        .validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let warning = self.warning_limit.num_minutes();
        let overdue = self.overdue_limit.num_minutes();

        if warning <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "SLA_WARNING_MINUTES",
                value: warning.to_string(),
            });
        }
        if warning >= overdue {
            return Err(ConfigError::ThresholdOrder { warning, overdue });
        }

        Ok(self)
    }

    /// Configured chat id for a managing-party channel, if any.
    pub fn chat_id_for(&self, key: ChannelKey) -> Option<&str> {
        self.group_chat_ids.get(&key).map(String::as_str)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            timezone: chrono_tz::Asia::Jakarta,
            warning_limit: Duration::hours(1),
            overdue_limit: Duration::hours(2),
            bot_token: "test-token".to_string(),
            primary_chat_id: "-100".to_string(),
            group_chat_ids: HashMap::new(),
            send_timeout: std::time::Duration::from_secs(1),
            sweep_interval: std::time::Duration::from_secs(300),
        }
    }
}

fn env_i64(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}
