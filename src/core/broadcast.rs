use crate::core::aggregate::unresolvable;
use crate::core::status;
use crate::domain::model::{BroadcastReport, DeliveryFailure, Member, MembershipStatus, Recipient};
use crate::domain::ports::DeliverySink;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BroadcastOptions {
    pub lookahead_days: i64,
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            lookahead_days: status::DEFAULT_LOOKAHEAD_DAYS,
            concurrency: 5,
            timeout: Duration::from_secs(10),
        }
    }
}

/// 只寄給狀態為 active 的會員（不含即將到期與已到期）
pub fn active_recipients(
    members: &[Member],
    today: NaiveDate,
    lookahead_days: i64,
    report: &mut BroadcastReport,
) -> Vec<Recipient> {
    let mut recipients = Vec::new();
    for member in members {
        match status::resolve_with_window(member, today, lookahead_days) {
            Ok(MembershipStatus::Active) => recipients.push(Recipient::from(member)),
            Ok(_) => {}
            Err(e) => report.unresolvable.push(unresolvable(member, e)),
        }
    }
    recipients
}

/// 單一收件者失敗不影響其他人，結果彙整在報告中。不做重試。
pub async fn broadcast<D: DeliverySink + ?Sized>(
    message: &str,
    members: &[Member],
    today: NaiveDate,
    sink: &D,
    options: BroadcastOptions,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    let recipients = active_recipients(members, today, options.lookahead_days, &mut report);
    report.attempted = recipients.len();

    tracing::info!("Broadcasting to {} active members", recipients.len());

    let outcomes: Vec<_> = stream::iter(recipients)
        .map(|recipient| async move {
            let outcome = match tokio::time::timeout(options.timeout, sink.send(&recipient, message)).await {
                Ok(Ok(receipt)) => Ok(receipt.message_id),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("delivery timed out after {:?}", options.timeout)),
            };
            (recipient.member_id, outcome)
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    for (member_id, outcome) in outcomes {
        match outcome {
            Ok(message_id) => {
                report.sent_count += 1;
                report.sent_ids.push(member_id);
                report.message_ids.push(message_id);
            }
            Err(reason) => {
                tracing::warn!(member_id, "Broadcast delivery failed: {}", reason);
                report.failures.push(DeliveryFailure { member_id, reason });
            }
        }
    }
    report.sent_ids.sort_unstable();
    report.failures.sort_by_key(|f| f.member_id);

    tracing::info!(
        "Broadcast sent: {}/{} successful",
        report.sent_count,
        report.attempted
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::tests::{date, member};
    use crate::domain::model::{DeliveryReceipt, DeliveryStatus};
    use crate::utils::error::{GymError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FlakySink {
        fail_for: u64,
        stall_for: Option<u64>,
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl DeliverySink for FlakySink {
        async fn send(&self, recipient: &Recipient, _message: &str) -> Result<DeliveryReceipt> {
            self.seen.lock().unwrap().push(recipient.member_id);
            if Some(recipient.member_id) == self.stall_for {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if recipient.member_id == self.fail_for {
                return Err(GymError::DeliveryError {
                    member_id: recipient.member_id,
                    message: "provider rejected number".to_string(),
                });
            }
            Ok(DeliveryReceipt {
                message_id: format!("msg-{}", recipient.member_id),
                status: DeliveryStatus::Mock,
            })
        }
    }

    fn roster() -> Vec<Member> {
        let mut members: Vec<_> = (1..=6)
            .map(|id| member(id, "Active", "2024-06-01", 3))
            .collect();
        members.push(member(7, "Soon", "2024-05-12", 1));
        members.push(member(8, "Gone", "2024-04-01", 1));
        members
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_rest() {
        let sink = FlakySink {
            fail_for: 4,
            stall_for: None,
            seen: Mutex::new(Vec::new()),
        };
        let report = broadcast(
            "Closed Sunday",
            &roster(),
            date("2024-06-10"),
            &sink,
            BroadcastOptions::default(),
        )
        .await;

        assert_eq!(report.attempted, 6);
        assert_eq!(report.sent_count, 5);
        assert_eq!(report.sent_ids, vec![1, 2, 3, 5, 6]);
        assert_eq!(report.failed_ids(), vec![4]);

        let mut seen = sink.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_delivery_times_out_as_failure() {
        let sink = FlakySink {
            fail_for: 0,
            stall_for: Some(2),
            seen: Mutex::new(Vec::new()),
        };
        let options = BroadcastOptions {
            timeout: Duration::from_secs(1),
            ..BroadcastOptions::default()
        };
        let report = broadcast("Hello", &roster(), date("2024-06-10"), &sink, options).await;

        assert_eq!(report.sent_count, 5);
        assert_eq!(report.failed_ids(), vec![2]);
        assert!(report.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn nobody_active_means_empty_report() {
        let sink = FlakySink {
            fail_for: 0,
            stall_for: None,
            seen: Mutex::new(Vec::new()),
        };
        let report = broadcast("Hi", &roster()[6..], date("2024-06-10"), &sink, BroadcastOptions::default()).await;
        assert_eq!(report.attempted, 0);
        assert_eq!(report.success_rate(), 0.0);
    }
}
