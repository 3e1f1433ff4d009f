pub mod aggregate;
pub mod broadcast;
pub mod dedup;
pub mod engine;
pub mod messages;
pub mod notifications;
pub mod status;

pub use crate::domain::model::{Member, MembershipStatus, NotificationItem, Urgency};
pub use crate::domain::ports::{Clock, DeliverySink, MemberStore, ReminderStore};
pub use crate::utils::error::Result;
