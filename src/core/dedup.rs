use crate::domain::model::{MemberId, ReminderRecord};
use crate::domain::ports::ReminderStore;
use crate::utils::error::Result;
use chrono::{DateTime, NaiveDate, Utc};

/// 每位會員每個到期區間最多寄出一次提醒。
///
/// 所有判斷都透過 [`ReminderStore::claim`] 完成，兩個同時的
/// `mark_sent` 只會有一個拿到 `true`。儲存端錯誤一律往上拋，
/// 呼叫端不得在錯誤時當作「尚未寄送」。
pub struct ReminderDeduplicator<R: ReminderStore> {
    store: R,
}

impl<R: ReminderStore> ReminderDeduplicator<R> {
    pub fn new(store: R) -> Self {
        Self { store }
    }

    /// 原子地取得寄送權。`None` 表示取得成功，否則回傳既有紀錄。
    pub async fn try_claim(
        &self,
        member_id: MemberId,
        window_end: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Option<ReminderRecord>> {
        let existing = self
            .store
            .claim(ReminderRecord {
                member_id,
                window_end,
                sent_at: at,
            })
            .await?;

        match &existing {
            None => tracing::debug!(member_id, %window_end, "Reminder marked as sent"),
            Some(_) => tracing::debug!(member_id, %window_end, "Reminder already sent for this window"),
        }
        Ok(existing)
    }

    /// Returns `true` only for the first transition into "sent" for this window.
    pub async fn mark_sent(
        &self,
        member_id: MemberId,
        window_end: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.try_claim(member_id, window_end, at).await?.is_none())
    }

    pub async fn has_sent(&self, member_id: MemberId) -> Result<bool> {
        Ok(self.store.get(member_id).await?.is_some())
    }

    pub async fn has_sent_for(&self, member_id: MemberId, window_end: NaiveDate) -> Result<bool> {
        Ok(self
            .store
            .get(member_id)
            .await?
            .is_some_and(|record| record.window_end == window_end))
    }

    /// 續約時呼叫，會員重新進入可提醒名單
    pub async fn reset(&self, member_id: MemberId) -> Result<()> {
        self.store.remove(member_id).await?;
        tracing::debug!(member_id, "Reminder record reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reminder_store::InMemoryReminderStore;
    use crate::core::status::tests::date;
    use std::sync::Arc;

    #[tokio::test]
    async fn mark_then_reset() {
        let dedup = ReminderDeduplicator::new(InMemoryReminderStore::new());
        let end = date("2024-02-15");

        assert!(!dedup.has_sent(1).await.unwrap());
        assert!(dedup.mark_sent(1, end, Utc::now()).await.unwrap());
        assert!(dedup.has_sent(1).await.unwrap());
        assert!(!dedup.mark_sent(1, end, Utc::now()).await.unwrap());

        dedup.reset(1).await.unwrap();
        assert!(!dedup.has_sent(1).await.unwrap());
        assert!(dedup.mark_sent(1, end, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn new_window_supersedes_old_record() {
        let dedup = ReminderDeduplicator::new(InMemoryReminderStore::new());
        assert!(dedup.mark_sent(9, date("2024-02-15"), Utc::now()).await.unwrap());
        assert!(!dedup.has_sent_for(9, date("2024-03-15")).await.unwrap());
        assert!(dedup.mark_sent(9, date("2024-03-15"), Utc::now()).await.unwrap());
        assert!(dedup.has_sent_for(9, date("2024-03-15")).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_marks_have_one_winner() {
        let dedup = Arc::new(ReminderDeduplicator::new(InMemoryReminderStore::new()));
        let end = date("2024-02-15");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let dedup = Arc::clone(&dedup);
                tokio::spawn(async move { dedup.mark_sent(42, end, Utc::now()).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
