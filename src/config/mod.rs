#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::{GymConfig, Provider};

use crate::adapters::clock::{ConfiguredClock, FixedClock, SystemClock};
use crate::adapters::delivery::{ConfiguredSink, LogDeliverySink, WebhookDeliverySink};
use crate::utils::error::Result;
use chrono::NaiveDate;

/// `today` 有值時固定日期，否則使用設定的時區
pub fn build_clock(config: &GymConfig, today: Option<NaiveDate>) -> Result<ConfiguredClock> {
    match today {
        Some(day) => Ok(ConfiguredClock::Fixed(FixedClock::new(day))),
        None => Ok(ConfiguredClock::System(SystemClock::new(config.utc_offset()?))),
    }
}

pub fn build_sink(config: &GymConfig) -> Result<ConfiguredSink> {
    match config.provider() {
        Provider::Mock => Ok(ConfiguredSink::Log(LogDeliverySink)),
        Provider::Webhook { endpoint } => Ok(ConfiguredSink::Webhook(WebhookDeliverySink::new(
            endpoint,
            config.delivery.auth_token.clone(),
            config.delivery_timeout(),
        )?)),
    }
}
