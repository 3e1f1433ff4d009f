use crate::domain::model::MembershipPlan;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

pub const DEFAULT_GYM_NAME: &str = "FitZone Gym";

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// 金額以千分位、兩位小數呈現，例如 `12,500.00`
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, cents)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// 通知列表上的短訊息
pub fn feed_message(days_left: i64) -> String {
    match days_left {
        0 => "Membership expires today".to_string(),
        n if n > 0 => format!("Membership expires in {} day{}", n, plural(n)),
        n => format!("Membership expired {} day{} ago", -n, plural(-n)),
    }
}

/// 寄給會員的簡訊範本
pub struct MessageTemplates<'a> {
    gym_name: &'a str,
}

impl<'a> MessageTemplates<'a> {
    pub fn new(gym_name: &'a str) -> Self {
        Self { gym_name }
    }

    pub fn expiry_reminder(&self, member_name: &str, days_left: i64) -> String {
        match days_left {
            0 => format!(
                "Hi {}, your {} membership expires TODAY. Renew now to avoid any break in your training!",
                member_name, self.gym_name
            ),
            n if n > 0 => format!(
                "Hi {}, your {} membership expires in {} day{}. Renew now to continue your fitness journey without interruption!",
                member_name,
                self.gym_name,
                n,
                plural(n)
            ),
            _ => format!(
                "Hi {}, your {} membership has expired. We miss you! Renew today and get back to achieving your goals.",
                member_name, self.gym_name
            ),
        }
    }

    pub fn renewal_success(&self, member_name: &str, end_date: NaiveDate) -> String {
        format!(
            "Great news, {}! Your {} membership has been renewed. New validity: {}. Keep up the amazing work!",
            member_name,
            self.gym_name,
            format_date(end_date)
        )
    }

    pub fn welcome(&self, member_name: &str) -> String {
        format!(
            "Welcome to {}, {}! Your membership is now active. We're excited to have you on this fitness journey!",
            self.gym_name, member_name
        )
    }

    /// 到期日無法推導時顯示 N/A
    pub fn membership_confirmation(
        &self,
        member_name: &str,
        plan: MembershipPlan,
        end_date: Option<NaiveDate>,
    ) -> String {
        format!(
            "Hi {}, your {} membership is confirmed! Plan: {} | Valid until: {}. See you at the gym!",
            member_name,
            self.gym_name,
            plan.display_name(),
            end_date.map(format_date).unwrap_or_else(|| "N/A".to_string())
        )
    }

    pub fn payment_reminder(&self, member_name: &str, amount: Decimal) -> String {
        format!(
            "Hi {}, this is a reminder about your pending payment of \u{20b9}{} at {}. Please clear it at your earliest convenience.",
            member_name,
            format_amount(amount),
            self.gym_name
        )
    }

    pub fn broadcast(&self, message: &str) -> String {
        format!("[{}] {}", self.gym_name, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_messages_cover_past_present_future() {
        assert_eq!(feed_message(5), "Membership expires in 5 days");
        assert_eq!(feed_message(1), "Membership expires in 1 day");
        assert_eq!(feed_message(0), "Membership expires today");
        assert_eq!(feed_message(-3), "Membership expired 3 days ago");
        assert_eq!(feed_message(-1), "Membership expired 1 day ago");
    }

    #[test]
    fn expiry_today_gets_its_own_template() {
        let templates = MessageTemplates::new("Iron Den");
        assert!(templates.expiry_reminder("Asha", 0).contains("expires TODAY"));
        assert!(templates.expiry_reminder("Asha", 2).contains("expires in 2 days"));
        assert!(templates.expiry_reminder("Asha", -1).contains("has expired"));
    }

    #[test]
    fn amounts_use_thousands_separators() {
        assert_eq!(format_amount(Decimal::new(150000, 2)), "1,500.00");
        assert_eq!(format_amount(Decimal::new(12345678, 1)), "1,234,567.80");
        assert_eq!(format_amount(Decimal::new(999, 0)), "999.00");
        assert_eq!(format_amount(Decimal::new(5, 3)), "0.01");
        assert_eq!(format_amount(Decimal::new(-250050, 2)), "-2,500.50");
    }

    #[test]
    fn confirmation_shows_plan_and_validity() {
        let templates = MessageTemplates::new("Iron Den");
        let end = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(
            templates.membership_confirmation("Meera", MembershipPlan::Both, Some(end)),
            "Hi Meera, your Iron Den membership is confirmed! Plan: Strength + Cardio | Valid until: 01 Jul 2024. See you at the gym!"
        );
        assert!(templates
            .membership_confirmation("Meera", MembershipPlan::Cardio, None)
            .contains("Plan: Cardio | Valid until: N/A"));
    }

    #[test]
    fn payment_and_welcome_templates() {
        let templates = MessageTemplates::new("Iron Den");
        assert!(templates
            .payment_reminder("Ravi", Decimal::new(420050, 2))
            .contains("pending payment of \u{20b9}4,200.50 at Iron Den"));
        assert!(templates.welcome("Ravi").starts_with("Welcome to Iron Den, Ravi!"));
    }

    #[test]
    fn renewal_formats_the_new_end_date() {
        let templates = MessageTemplates::new("Iron Den");
        let end = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert!(templates
            .renewal_success("Ravi", end)
            .contains("New validity: 05 Mar 2024"));
        assert_eq!(templates.broadcast("Closed Sunday"), "[Iron Den] Closed Sunday");
    }
}
