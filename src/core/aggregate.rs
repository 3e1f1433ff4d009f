use crate::core::status;
use crate::domain::model::{DashboardSummary, Member, MembershipStatus, UnresolvableMember};
use crate::utils::error::GymError;
use chrono::NaiveDate;

pub fn aggregate(members: &[Member], today: NaiveDate) -> DashboardSummary {
    aggregate_with_window(members, today, status::DEFAULT_LOOKAHEAD_DAYS)
}

/// 單次掃描統計各狀態人數；無法推導的紀錄另列，不計入 `total`。
pub fn aggregate_with_window(
    members: &[Member],
    today: NaiveDate,
    lookahead_days: i64,
) -> DashboardSummary {
    let mut summary = DashboardSummary::default();

    for member in members {
        match status::resolve_with_window(member, today, lookahead_days) {
            Ok(state) => {
                summary.total += 1;
                match state {
                    MembershipStatus::Active => summary.active += 1,
                    MembershipStatus::ExpiringSoon => summary.expiring_soon += 1,
                    MembershipStatus::Expired => summary.expired += 1,
                }
            }
            Err(e) => summary.unresolvable.push(unresolvable(member, e)),
        }
    }

    tracing::debug!(
        "Aggregated {} members: {} active, {} expiring soon, {} expired, {} unresolvable",
        summary.total,
        summary.active,
        summary.expiring_soon,
        summary.expired,
        summary.unresolvable.len()
    );

    summary
}

pub(crate) fn unresolvable(member: &Member, error: GymError) -> UnresolvableMember {
    tracing::warn!(member_id = member.id, "Skipping member record: {}", error);
    match error {
        GymError::ValidationError { field, reason, .. } => UnresolvableMember {
            member_id: member.id,
            field,
            reason,
        },
        other => UnresolvableMember {
            member_id: member.id,
            field: "record".to_string(),
            reason: other.to_string(),
        },
    }
}
