use crate::core::aggregate::aggregate_with_window;
use crate::core::broadcast::{self, BroadcastOptions};
use crate::core::dedup::ReminderDeduplicator;
use crate::core::messages::{MessageTemplates, DEFAULT_GYM_NAME};
use crate::core::notifications::{list_expiring, FeedWindow};
use crate::core::status;
use crate::domain::model::{
    BroadcastReport, DashboardSummary, DeliveryFailure, DeliveryReceipt, Member, MemberId,
    MessageLogEntry, NotificationFeed, NotificationType, Recipient, ReminderOutcome, SweepReport,
};
use crate::domain::ports::{Clock, DeliverySink, MemberStore, MessageLog, ReminderStore};
use crate::utils::error::{GymError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub gym_name: String,
    pub window: FeedWindow,
    /// 排程提醒只在這些剩餘天數寄出
    pub reminder_days: Vec<i64>,
    pub broadcast_concurrency: usize,
    pub delivery_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            gym_name: DEFAULT_GYM_NAME.to_string(),
            window: FeedWindow::default(),
            reminder_days: vec![5, 1, 0],
            broadcast_concurrency: 5,
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

pub struct LifecycleEngine<S, C, D, R>
where
    S: MemberStore,
    C: Clock,
    D: DeliverySink,
    R: ReminderStore,
{
    store: S,
    clock: C,
    sink: D,
    reminders: ReminderDeduplicator<R>,
    message_log: Option<Arc<dyn MessageLog>>,
    settings: EngineSettings,
}

impl<S, C, D, R> LifecycleEngine<S, C, D, R>
where
    S: MemberStore,
    C: Clock,
    D: DeliverySink,
    R: ReminderStore,
{
    pub fn new(store: S, clock: C, sink: D, reminder_store: R, settings: EngineSettings) -> Self {
        Self {
            store,
            clock,
            sink,
            reminders: ReminderDeduplicator::new(reminder_store),
            message_log: None,
            settings,
        }
    }

    /// 每則成功交給供應商的訊息都寫一筆稽核紀錄
    pub fn with_message_log(mut self, log: Arc<dyn MessageLog>) -> Self {
        self.message_log = Some(log);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn templates(&self) -> MessageTemplates<'_> {
        MessageTemplates::new(&self.settings.gym_name)
    }

    async fn require_member(&self, member_id: MemberId) -> Result<Member> {
        self.store
            .get_member(member_id)
            .await?
            .ok_or(GymError::MemberNotFound { member_id })
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        let members = self.store.list_members().await?;
        let today = self.clock.today();
        Ok(aggregate_with_window(
            &members,
            today,
            self.settings.window.lookahead_days,
        ))
    }

    pub async fn expiring(&self) -> Result<NotificationFeed> {
        let members = self.store.list_members().await?;
        let today = self.clock.today();
        let feed = list_expiring(&members, today, self.settings.window);
        tracing::debug!("{} members in the expiry feed for {}", feed.count(), today);
        Ok(feed)
    }

    pub async fn has_sent(&self, member_id: MemberId) -> Result<bool> {
        self.reminders.has_sent(member_id).await
    }

    pub async fn send_reminder(&self, member_id: MemberId) -> Result<ReminderOutcome> {
        let member = self.require_member(member_id).await?;
        let today = self.clock.today();
        self.remind(&member, today).await
    }

    /// 先取得寄送權再投遞。供應商明確拒收時釋放寄送權，讓之後可以重試；
    /// 逾時或結果不明時保留，寧可漏寄也不重寄。
    /// 提醒紀錄讀寫失敗時直接回錯，不寄送。
    async fn remind(&self, member: &Member, today: NaiveDate) -> Result<ReminderOutcome> {
        let end = status::end_date(member)?;
        let days_left = status::days_left(end, today);
        if !self.settings.window.contains(days_left) {
            return Err(GymError::NotEligible {
                member_id: member.id,
                days_left,
            });
        }

        if let Some(existing) = self
            .reminders
            .try_claim(member.id, end, self.clock.now())
            .await?
        {
            return Ok(ReminderOutcome::AlreadySent {
                member_id: member.id,
                sent_at: existing.sent_at,
            });
        }

        let message = self.templates().expiry_reminder(&member.name, days_left);
        let kind = if days_left < 0 {
            NotificationType::MembershipExpired
        } else {
            NotificationType::ExpiryReminder
        };
        match self.deliver(member, &message).await {
            Ok(receipt) => {
                self.audit(kind, &message, vec![member.id]).await;
                tracing::info!(
                    member_id = member.id,
                    days_left,
                    message_id = %receipt.message_id,
                    "Expiry reminder sent"
                );
                Ok(ReminderOutcome::Sent {
                    member_id: member.id,
                    days_left,
                    message_id: receipt.message_id,
                })
            }
            Err(e @ GymError::DeliveryError { .. }) => {
                if let Err(release) = self.reminders.reset(member.id).await {
                    tracing::error!(
                        member_id = member.id,
                        "Could not release reminder claim, member stays blocked until reset: {}",
                        release
                    );
                }
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    member_id = member.id,
                    "Reminder outcome unknown, keeping the claim so it is not resent: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// `DeliveryError` 只用於確定沒有送出的情況，其他失敗都是 `DeliveryUnconfirmed`
    async fn deliver(&self, member: &Member, message: &str) -> Result<DeliveryReceipt> {
        let recipient = Recipient::from(member);
        let timeout = self.settings.delivery_timeout;
        match tokio::time::timeout(timeout, self.sink.send(&recipient, message)).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(
                e @ (GymError::DeliveryError { .. } | GymError::DeliveryUnconfirmed { .. }),
            )) => Err(e),
            Ok(Err(other)) => Err(GymError::DeliveryUnconfirmed {
                member_id: member.id,
                message: other.to_string(),
            }),
            Err(_) => Err(GymError::DeliveryUnconfirmed {
                member_id: member.id,
                message: format!("no answer from provider within {:?}", timeout),
            }),
        }
    }

    /// 稽核紀錄寫入失敗不影響已寄出的訊息
    async fn audit(&self, kind: NotificationType, message: &str, recipients: Vec<MemberId>) {
        let Some(log) = &self.message_log else {
            return;
        };
        if recipients.is_empty() {
            return;
        }
        let entry = MessageLogEntry::new(kind, message, recipients, self.clock.now());
        let entry_id = entry.id.clone();
        match log.append(entry).await {
            Ok(()) => tracing::debug!("Notification logged: {}", entry_id),
            Err(e) => tracing::error!("Failed to log notification: {}", e),
        }
    }

    async fn notify(
        &self,
        member: &Member,
        kind: NotificationType,
        message: &str,
    ) -> Result<DeliveryReceipt> {
        let receipt = self.deliver(member, message).await?;
        self.audit(kind, message, vec![member.id]).await;
        tracing::info!(
            member_id = member.id,
            message_id = %receipt.message_id,
            "{:?} sent",
            kind
        );
        Ok(receipt)
    }

    /// 排程用：對剩餘天數落在 `reminder_days` 的會員各寄一次提醒
    pub async fn run_reminder_sweep(&self) -> Result<SweepReport> {
        let members = self.store.list_members().await?;
        let today = self.clock.today();
        let feed = list_expiring(&members, today, self.settings.window);

        let mut report = SweepReport {
            unresolvable: feed.unresolvable,
            ..SweepReport::default()
        };

        for item in feed
            .items
            .iter()
            .filter(|item| self.settings.reminder_days.contains(&item.days_left))
        {
            let Some(member) = members.iter().find(|m| m.id == item.member_id) else {
                continue;
            };
            match self.remind(member, today).await {
                Ok(ReminderOutcome::Sent { member_id, .. }) => report.sent.push(member_id),
                Ok(ReminderOutcome::AlreadySent { member_id, .. }) => {
                    report.already_sent.push(member_id)
                }
                Err(e) => {
                    tracing::warn!(member_id = member.id, "Reminder failed: {}", e);
                    report.failures.push(DeliveryFailure {
                        member_id: member.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Reminder sweep for {}: {} sent, {} already sent, {} failed",
            today,
            report.sent.len(),
            report.already_sent.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// 續約後呼叫：清除提醒紀錄並寄送續約確認
    pub async fn record_renewal(&self, member_id: MemberId) -> Result<DeliveryReceipt> {
        let member = self.require_member(member_id).await?;
        let end = status::end_date(&member)?;

        self.reminders.reset(member_id).await?;
        tracing::info!(member_id, new_end_date = %end, "Membership renewed");

        let message = self.templates().renewal_success(&member.name, end);
        self.notify(&member, NotificationType::RenewalSuccess, &message)
            .await
    }

    /// 手動清除提醒紀錄，用於確認 `DeliveryUnconfirmed` 的訊息其實沒送達之後
    pub async fn clear_reminder(&self, member_id: MemberId) -> Result<()> {
        self.require_member(member_id).await?;
        self.reminders.reset(member_id).await?;
        tracing::info!(member_id, "Reminder claim cleared by operator");
        Ok(())
    }

    pub async fn send_welcome(&self, member_id: MemberId) -> Result<DeliveryReceipt> {
        let member = self.require_member(member_id).await?;
        let message = self.templates().welcome(&member.name);
        self.notify(&member, NotificationType::Welcome, &message).await
    }

    pub async fn send_membership_confirmation(
        &self,
        member_id: MemberId,
    ) -> Result<DeliveryReceipt> {
        let member = self.require_member(member_id).await?;
        let end = status::end_date(&member).ok();
        let message =
            self.templates()
                .membership_confirmation(&member.name, member.membership_plan, end);
        self.notify(&member, NotificationType::MembershipConfirmation, &message)
            .await
    }

    /// `amount` 未指定時以會員的 `amount_paid` 為準
    pub async fn send_payment_reminder(
        &self,
        member_id: MemberId,
        amount: Option<Decimal>,
    ) -> Result<DeliveryReceipt> {
        let member = self.require_member(member_id).await?;
        let amount = amount.unwrap_or(member.amount_paid);
        if amount <= Decimal::ZERO {
            return Err(GymError::validation(
                Some(member_id),
                "amount",
                "must be greater than zero",
            ));
        }
        let message = self.templates().payment_reminder(&member.name, amount);
        self.notify(&member, NotificationType::PaymentReminder, &message)
            .await
    }

    /// 稽核紀錄，新的在前；指定會員時只列出寄給該會員的訊息
    pub async fn message_history(
        &self,
        member_id: Option<MemberId>,
        limit: usize,
    ) -> Result<Vec<MessageLogEntry>> {
        let Some(log) = &self.message_log else {
            return Ok(Vec::new());
        };
        let mut entries = log.entries().await?;
        entries.reverse();
        Ok(entries
            .into_iter()
            .filter(|entry| member_id.map_or(true, |id| entry.involves(id)))
            .take(limit)
            .collect())
    }

    pub async fn broadcast(&self, message: &str) -> Result<BroadcastReport> {
        if message.trim().is_empty() {
            return Err(GymError::validation(None, "message", "cannot be empty"));
        }

        let members = self.store.list_members().await?;
        let today = self.clock.today();
        let full_message = self.templates().broadcast(message.trim());
        let options = BroadcastOptions {
            lookahead_days: self.settings.window.lookahead_days,
            concurrency: self.settings.broadcast_concurrency,
            timeout: self.settings.delivery_timeout,
        };

        let report = broadcast::broadcast(&full_message, &members, today, &self.sink, options).await;
        self.audit(
            NotificationType::Broadcast,
            &full_message,
            report.sent_ids.clone(),
        )
        .await;
        Ok(report)
    }
}
