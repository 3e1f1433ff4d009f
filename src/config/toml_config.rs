use crate::adapters::clock::parse_utc_offset;
use crate::core::engine::EngineSettings;
use crate::core::messages::DEFAULT_GYM_NAME;
use crate::core::notifications::FeedWindow;
use crate::utils::error::{GymError, Result};
use crate::utils::validation::{self, Validate};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GymConfig {
    #[serde(default)]
    pub gym: GymSection,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymSection {
    #[serde(default = "default_gym_name")]
    pub name: String,
}

impl Default for GymSection {
    fn default() -> Self {
        Self {
            name: default_gym_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// 全系統統一的時區偏移，例如 "+05:30"
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,
    #[serde(default = "default_expired_grace_days")]
    pub expired_grace_days: i64,
    #[serde(default = "default_reminder_days")]
    pub reminder_days: Vec<i64>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            lookahead_days: default_lookahead_days(),
            expired_grace_days: default_expired_grace_days(),
            reminder_days: default_reminder_days(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_broadcast_concurrency")]
    pub broadcast_concurrency: usize,
}

// 手寫 Debug：`-v` 會印出整份設定，token 不能進 log
impl fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_seconds", &self.timeout_seconds)
            .field("broadcast_concurrency", &self.broadcast_concurrency)
            .finish()
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: None,
            auth_token: None,
            timeout_seconds: default_timeout_seconds(),
            broadcast_concurrency: default_broadcast_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_members_path")]
    pub members_path: String,
    #[serde(default = "default_reminders_path")]
    pub reminders_path: String,
    /// 已寄出訊息的稽核紀錄（JSON Lines）
    #[serde(default = "default_message_log_path")]
    pub message_log_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            members_path: default_members_path(),
            reminders_path: default_reminders_path(),
            message_log_path: default_message_log_path(),
        }
    }
}

fn default_gym_name() -> String {
    DEFAULT_GYM_NAME.to_string()
}

fn default_utc_offset() -> String {
    "+05:30".to_string()
}

fn default_lookahead_days() -> i64 {
    7
}

fn default_expired_grace_days() -> i64 {
    7
}

fn default_reminder_days() -> Vec<i64> {
    vec![5, 1, 0]
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_broadcast_concurrency() -> usize {
    5
}

fn default_members_path() -> String {
    "./data/members.json".to_string()
}

fn default_reminders_path() -> String {
    "./data/reminders.json".to_string()
}

fn default_message_log_path() -> String {
    "./data/messages.jsonl".to_string()
}

/// 投遞供應商
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    Mock,
    Webhook { endpoint: String },
}

impl GymConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GymError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GymError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SMS_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GymError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.clock.utc_offset)
    }

    pub fn provider(&self) -> Provider {
        match self.delivery.provider.to_ascii_lowercase().as_str() {
            "mock" => Provider::Mock,
            "webhook" => match &self.delivery.endpoint {
                Some(endpoint) => Provider::Webhook {
                    endpoint: endpoint.clone(),
                },
                None => {
                    tracing::warn!("Webhook provider has no endpoint, falling back to mock");
                    Provider::Mock
                }
            },
            other => {
                tracing::warn!("Unknown provider '{}', falling back to mock", other);
                Provider::Mock
            }
        }
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery.timeout_seconds)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            gym_name: self.gym.name.clone(),
            window: FeedWindow {
                lookahead_days: self.notifications.lookahead_days,
                expired_grace_days: self.notifications.expired_grace_days,
            },
            reminder_days: self.notifications.reminder_days.clone(),
            broadcast_concurrency: self.delivery.broadcast_concurrency,
            delivery_timeout: self.delivery_timeout(),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("gym.name", &self.gym.name)?;
        self.utc_offset()?;

        validation::validate_range("notifications.lookahead_days", self.notifications.lookahead_days, 0, 90)?;
        validation::validate_range(
            "notifications.expired_grace_days",
            self.notifications.expired_grace_days,
            0,
            365,
        )?;
        for day in &self.notifications.reminder_days {
            validation::validate_range(
                "notifications.reminder_days",
                *day,
                -self.notifications.expired_grace_days,
                self.notifications.lookahead_days,
            )?;
        }

        validation::validate_positive_number(
            "delivery.broadcast_concurrency",
            self.delivery.broadcast_concurrency,
            1,
        )?;
        validation::validate_range("delivery.timeout_seconds", self.delivery.timeout_seconds, 1, 300)?;
        if self.delivery.provider.eq_ignore_ascii_case("webhook") {
            let endpoint = validation::validate_required_field("delivery.endpoint", &self.delivery.endpoint)?;
            validation::validate_url("delivery.endpoint", endpoint)?;
        }

        validation::validate_path("storage.members_path", &self.storage.members_path)?;
        validation::validate_file_extension("storage.members_path", &self.storage.members_path, &["json", "csv"])?;
        validation::validate_path("storage.reminders_path", &self.storage.reminders_path)?;
        validation::validate_path("storage.message_log_path", &self.storage.message_log_path)?;

        Ok(())
    }
}

impl Validate for GymConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
