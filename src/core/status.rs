//! 會員狀態推導。
//!
//! 到期日 = 開始日 + `duration_months` 個日曆月。目標月份沒有該日時
//! 取該月最後一天（例如 1/31 + 1 個月 = 2/29 或 2/28），不會溢位到下個月。

use crate::domain::model::{Member, MembershipStatus};
use crate::utils::error::{GymError, Result};
use chrono::{Months, NaiveDate};

pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;

/// Calendar-month addition, clamped to the last day of the target month.
pub fn add_months(start: NaiveDate, months: u32) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(months))
}

pub fn end_date(member: &Member) -> Result<NaiveDate> {
    let start = member
        .start_date
        .ok_or_else(|| GymError::validation(Some(member.id), "start_date", "is missing"))?;

    if member.duration_months <= 0 {
        return Err(GymError::validation(
            Some(member.id),
            "duration_months",
            format!("must be positive, got {}", member.duration_months),
        ));
    }

    add_months(start, member.duration_months as u32).ok_or_else(|| {
        GymError::validation(
            Some(member.id),
            "duration_months",
            format!("{} months from {} is out of range", member.duration_months, start),
        )
    })
}

pub fn days_left(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

pub fn status_for(end_date: NaiveDate, today: NaiveDate, lookahead_days: i64) -> MembershipStatus {
    if today > end_date {
        MembershipStatus::Expired
    } else if days_left(end_date, today) <= lookahead_days {
        MembershipStatus::ExpiringSoon
    } else {
        MembershipStatus::Active
    }
}

/// 以預設 7 天提醒區間推導狀態
pub fn resolve(member: &Member, today: NaiveDate) -> Result<MembershipStatus> {
    resolve_with_window(member, today, DEFAULT_LOOKAHEAD_DAYS)
}

pub fn resolve_with_window(
    member: &Member,
    today: NaiveDate,
    lookahead_days: i64,
) -> Result<MembershipStatus> {
    Ok(status_for(end_date(member)?, today, lookahead_days))
}
