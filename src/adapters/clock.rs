use crate::domain::ports::Clock;
use crate::utils::error::{GymError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// 系統時鐘，以固定 UTC 偏移決定「今天」。
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Pinned date, used by tests and the `--today` flag.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> DateTime<Utc> {
        self.today.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

/// 由設定或 `--today` 決定的時鐘
#[derive(Debug, Clone, Copy)]
pub enum ConfiguredClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl Clock for ConfiguredClock {
    fn today(&self) -> NaiveDate {
        match self {
            ConfiguredClock::System(clock) => clock.today(),
            ConfiguredClock::Fixed(clock) => clock.today(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        match self {
            ConfiguredClock::System(clock) => clock.now(),
            ConfiguredClock::Fixed(clock) => clock.now(),
        }
    }
}

/// 解析 "+05:30"、"-08:00"、"Z" 形式的偏移
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    trimmed
        .parse::<FixedOffset>()
        .map_err(|e| GymError::InvalidConfigValueError {
            field: "clock.utc_offset".to_string(),
            value: value.to_string(),
            reason: format!("expected +HH:MM, -HH:MM or Z ({})", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_offsets() {
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("-08:00").unwrap().local_minus_utc(), -28800);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset(" utc ").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("05:30").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
        assert!(parse_utc_offset("+ab:00").is_err());

        match parse_utc_offset("IST") {
            Err(GymError::InvalidConfigValueError { field, value, .. }) => {
                assert_eq!(field, "clock.utc_offset");
                assert_eq!(value, "IST");
            }
            other => panic!("expected InvalidConfigValueError, got {:?}", other),
        }
    }

    #[test]
    fn fixed_clock_is_pinned() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let clock = FixedClock::new(day);
        assert_eq!(clock.today(), day);
        assert_eq!(clock.now().date_naive(), day);
    }
}
