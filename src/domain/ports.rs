use crate::domain::model::{
    DeliveryReceipt, Member, MemberId, MessageLogEntry, Recipient, ReminderRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// 取得「今天」。整個系統只使用一個時區。
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
}

pub trait MemberStore: Send + Sync {
    fn list_members(&self) -> impl std::future::Future<Output = Result<Vec<Member>>> + Send;
    fn get_member(
        &self,
        id: MemberId,
    ) -> impl std::future::Future<Output = Result<Option<Member>>> + Send;
}

/// 訊息投遞端（SMS / webhook / mock）。逾時與重試由實作自行負責。
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn send(&self, recipient: &Recipient, message: &str) -> Result<DeliveryReceipt>;
}

/// 提醒紀錄的儲存。`claim` 必須是原子的 check-and-set。
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// 寫入 `record`，除非同一會員已有相同 `window_end` 的紀錄。
    /// 成功寫入回傳 `None`；已存在時回傳既有紀錄且不做任何修改。
    /// 不同 `window_end` 的舊紀錄會被覆蓋。
    async fn claim(&self, record: ReminderRecord) -> Result<Option<ReminderRecord>>;
    async fn get(&self, member_id: MemberId) -> Result<Option<ReminderRecord>>;
    async fn remove(&self, member_id: MemberId) -> Result<()>;
}

/// 已寄出訊息的稽核紀錄，只增不改。
#[async_trait]
pub trait MessageLog: Send + Sync {
    async fn append(&self, entry: MessageLogEntry) -> Result<()>;
    /// 依寫入順序回傳全部紀錄
    async fn entries(&self) -> Result<Vec<MessageLogEntry>>;
}

#[async_trait]
impl<T: DeliverySink + ?Sized> DeliverySink for Arc<T> {
    async fn send(&self, recipient: &Recipient, message: &str) -> Result<DeliveryReceipt> {
        (**self).send(recipient, message).await
    }
}

#[async_trait]
impl<T: ReminderStore + ?Sized> ReminderStore for Arc<T> {
    async fn claim(&self, record: ReminderRecord) -> Result<Option<ReminderRecord>> {
        (**self).claim(record).await
    }

    async fn get(&self, member_id: MemberId) -> Result<Option<ReminderRecord>> {
        (**self).get(member_id).await
    }

    async fn remove(&self, member_id: MemberId) -> Result<()> {
        (**self).remove(member_id).await
    }
}
