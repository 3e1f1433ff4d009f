use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type MemberId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipPlan {
    Strength,
    Cardio,
    Both,
}

impl MembershipPlan {
    pub fn display_name(&self) -> &'static str {
        match self {
            MembershipPlan::Strength => "Strength",
            MembershipPlan::Cardio => "Cardio",
            MembershipPlan::Both => "Strength + Cardio",
        }
    }
}

/// 會員資料，由外部 CRUD 維護；引擎只讀不寫。
///
/// `start_date` 與 `duration_months` 保留原始儲存值，未經驗證；
/// 到期日一律在讀取時由 [`crate::core::status::end_date`] 推導。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub phone: String,
    pub membership_plan: MembershipPlan,
    pub start_date: Option<NaiveDate>,
    pub duration_months: i32,
    pub amount_paid: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    ExpiringSoon,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

/// 無法推導狀態的會員紀錄，與統計數字分開回報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvableMember {
    pub member_id: MemberId,
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub active: usize,
    pub expiring_soon: usize,
    pub expired: usize,
    pub unresolvable: Vec<UnresolvableMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationItem {
    pub member_id: MemberId,
    pub member_name: String,
    pub phone: String,
    pub end_date: NaiveDate,
    pub days_left: i64,
    pub urgency: Urgency,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationFeed {
    pub items: Vec<NotificationItem>,
    pub unresolvable: Vec<UnresolvableMember>,
}

impl NotificationFeed {
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// 提醒寄送紀錄。`window_end` 為寄送當下的到期日，續約後即失效。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub member_id: MemberId,
    pub window_end: NaiveDate,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub member_id: MemberId,
    pub name: String,
    pub phone: String,
}

impl From<&Member> for Recipient {
    fn from(member: &Member) -> Self {
        Self {
            member_id: member.id,
            name: member.name.clone(),
            phone: member.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    pub member_id: MemberId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub sent_count: usize,
    /// 成功送達的會員，依 id 排序
    pub sent_ids: Vec<MemberId>,
    pub failures: Vec<DeliveryFailure>,
    pub message_ids: Vec<String>,
    pub unresolvable: Vec<UnresolvableMember>,
}

impl BroadcastReport {
    pub fn failed_ids(&self) -> Vec<MemberId> {
        self.failures.iter().map(|f| f.member_id).collect()
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.sent_count as f64 / self.attempted as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReminderOutcome {
    Sent {
        member_id: MemberId,
        days_left: i64,
        message_id: String,
    },
    AlreadySent {
        member_id: MemberId,
        sent_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub sent: Vec<MemberId>,
    pub already_sent: Vec<MemberId>,
    pub failures: Vec<DeliveryFailure>,
    pub unresolvable: Vec<UnresolvableMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Welcome,
    MembershipConfirmation,
    ExpiryReminder,
    MembershipExpired,
    RenewalSuccess,
    PaymentReminder,
    Broadcast,
}

impl NotificationType {
    /// 訊息紀錄的前綴，例如 `[EXPIRY_REMINDER]`
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationType::Welcome => "[WELCOME]",
            NotificationType::MembershipConfirmation => "[MEMBERSHIP_CONFIRMATION]",
            NotificationType::ExpiryReminder => "[EXPIRY_REMINDER]",
            NotificationType::MembershipExpired => "[MEMBERSHIP_EXPIRED]",
            NotificationType::RenewalSuccess => "[RENEWAL_SUCCESS]",
            NotificationType::PaymentReminder => "[PAYMENT_REMINDER]",
            NotificationType::Broadcast => "[BROADCAST]",
        }
    }
}

/// 已寄出訊息的稽核紀錄，一次寄送（含廣播）一筆。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: String,
    pub notification_type: NotificationType,
    /// 帶有類型前綴的訊息內容
    pub message: String,
    pub recipients: Vec<MemberId>,
    pub sent_at: DateTime<Utc>,
}

impl MessageLogEntry {
    pub fn new(
        notification_type: NotificationType,
        message: &str,
        recipients: Vec<MemberId>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            notification_type,
            message: format!("{} {}", notification_type.tag(), message),
            recipients,
            sent_at,
        }
    }

    pub fn involves(&self, member_id: MemberId) -> bool {
        self.recipients.contains(&member_id)
    }
}
