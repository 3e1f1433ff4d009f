use crate::core::aggregate::unresolvable;
use crate::core::messages::feed_message;
use crate::core::status;
use crate::domain::model::{Member, NotificationFeed, NotificationItem, Urgency};
use chrono::NaiveDate;

pub const DEFAULT_EXPIRED_GRACE_DAYS: i64 = 7;

/// 通知列表的時間範圍：`days_left` 落在 `[-expired_grace_days, lookahead_days]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub lookahead_days: i64,
    pub expired_grace_days: i64,
}

impl Default for FeedWindow {
    fn default() -> Self {
        Self {
            lookahead_days: status::DEFAULT_LOOKAHEAD_DAYS,
            expired_grace_days: DEFAULT_EXPIRED_GRACE_DAYS,
        }
    }
}

impl FeedWindow {
    pub fn contains(&self, days_left: i64) -> bool {
        days_left >= -self.expired_grace_days && days_left <= self.lookahead_days
    }
}

pub fn urgency_for(days_left: i64) -> Urgency {
    match days_left {
        n if n <= 0 => Urgency::Critical,
        1..=2 => Urgency::High,
        3..=7 => Urgency::Medium,
        _ => Urgency::Low,
    }
}

pub fn build_item(member: &Member, end_date: NaiveDate, today: NaiveDate) -> NotificationItem {
    let days_left = status::days_left(end_date, today);
    NotificationItem {
        member_id: member.id,
        member_name: member.name.clone(),
        phone: member.phone.clone(),
        end_date,
        days_left,
        urgency: urgency_for(days_left),
        message: feed_message(days_left),
    }
}

/// 依 `days_left` 由小到大排序，同天數再依姓名、編號排序。
pub fn list_expiring(members: &[Member], today: NaiveDate, window: FeedWindow) -> NotificationFeed {
    let mut feed = NotificationFeed::default();

    for member in members {
        match status::end_date(member) {
            Ok(end) if window.contains(status::days_left(end, today)) => {
                feed.items.push(build_item(member, end, today));
            }
            Ok(_) => {}
            Err(e) => feed.unresolvable.push(unresolvable(member, e)),
        }
    }

    feed.items.sort_by(|a, b| {
        a.days_left
            .cmp(&b.days_left)
            .then_with(|| a.member_name.cmp(&b.member_name))
            .then_with(|| a.member_id.cmp(&b.member_id))
    });

    feed
}
