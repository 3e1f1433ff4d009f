pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliArgs, Command};

pub use config::GymConfig;
pub use crate::core::engine::{EngineSettings, LifecycleEngine};
pub use domain::model::{
    BroadcastReport, DashboardSummary, Member, MemberId, MembershipPlan, MembershipStatus,
    MessageLogEntry, NotificationFeed, NotificationItem, NotificationType, ReminderOutcome,
    Urgency,
};
pub use utils::error::{GymError, Result};
