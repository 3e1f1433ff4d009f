use crate::domain::model::MemberId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GymError {
    #[error("Invalid member data{}: {field} {reason}", member_label(.member_id))]
    ValidationError {
        member_id: Option<MemberId>,
        field: String,
        reason: String,
    },

    #[error("Reminder storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Delivery to member {member_id} failed: {message}")]
    DeliveryError { member_id: MemberId, message: String },

    /// 供應商可能已收下訊息（逾時、連線中斷），不可當作未寄出
    #[error("Delivery to member {member_id} is unconfirmed: {message}")]
    DeliveryUnconfirmed { member_id: MemberId, message: String },

    #[error("Member {member_id} not found")]
    MemberNotFound { member_id: MemberId },

    #[error("Member {member_id} is outside the reminder window ({days_left} days left)")]
    NotEligible { member_id: MemberId, days_left: i64 },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

fn member_label(member_id: &Option<MemberId>) -> String {
    member_id
        .map(|id| format!(" for member {}", id))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Storage,
    Delivery,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GymError {
    pub fn validation(member_id: Option<MemberId>, field: &str, reason: impl Into<String>) -> Self {
        GymError::ValidationError {
            member_id,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        GymError::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GymError::ValidationError { .. }
            | GymError::MemberNotFound { .. }
            | GymError::NotEligible { .. }
            | GymError::CsvError(_)
            | GymError::SerializationError(_) => ErrorCategory::Data,
            GymError::StorageUnavailable { .. } => ErrorCategory::Storage,
            GymError::DeliveryError { .. }
            | GymError::DeliveryUnconfirmed { .. }
            | GymError::HttpError(_) => ErrorCategory::Delivery,
            GymError::ConfigValidationError { .. }
            | GymError::InvalidConfigValueError { .. }
            | GymError::MissingConfigError { .. } => ErrorCategory::Configuration,
            GymError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 不在提醒區間屬於正常的業務拒絕
            GymError::NotEligible { .. } => ErrorSeverity::Low,
            GymError::DeliveryError { .. }
            | GymError::DeliveryUnconfirmed { .. }
            | GymError::HttpError(_) => ErrorSeverity::Medium,
            GymError::ValidationError { .. }
            | GymError::MemberNotFound { .. }
            | GymError::CsvError(_)
            | GymError::SerializationError(_)
            | GymError::ConfigValidationError { .. }
            | GymError::InvalidConfigValueError { .. }
            | GymError::MissingConfigError { .. } => ErrorSeverity::High,
            GymError::StorageUnavailable { .. } | GymError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GymError::ValidationError { field, .. } => {
                format!("A member record has an invalid '{}' field", field)
            }
            GymError::StorageUnavailable { .. } => {
                "Reminder history is unavailable, no reminder was sent".to_string()
            }
            GymError::DeliveryError { member_id, .. } => {
                format!("The message to member {} could not be delivered", member_id)
            }
            GymError::DeliveryUnconfirmed { member_id, .. } => format!(
                "The message to member {} may or may not have been delivered; it will not be resent automatically",
                member_id
            ),
            GymError::HttpError(_) => "The messaging provider could not be reached".to_string(),
            GymError::MemberNotFound { member_id } => {
                format!("No member with id {} exists", member_id)
            }
            GymError::NotEligible {
                member_id,
                days_left,
            } => format!(
                "Member {} does not need a reminder yet ({} days left)",
                member_id, days_left
            ),
            GymError::CsvError(_) | GymError::SerializationError(_) => {
                "The member file could not be read".to_string()
            }
            GymError::IoError(_) => "A file could not be read or written".to_string(),
            GymError::ConfigValidationError { .. }
            | GymError::InvalidConfigValueError { .. }
            | GymError::MissingConfigError { .. } => format!("Configuration problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        if let GymError::DeliveryUnconfirmed { .. } = self {
            return "Check the provider's delivery log; if the message never arrived, run reset-reminder and send again";
        }
        match self.category() {
            ErrorCategory::Data => "Check the member record and correct the offending field",
            ErrorCategory::Storage => {
                "Check that the reminder store file is readable and writable, then retry"
            }
            ErrorCategory::Delivery => {
                "Check the delivery provider endpoint and credentials, then retry"
            }
            ErrorCategory::Configuration => "Fix the configuration file and run check-config",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, GymError>;
