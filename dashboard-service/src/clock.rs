use std::fmt;

use community_domain::domain::DemandPeriod;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

/// Source of "now" for hour selection.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock shifted to a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn with_offset_hours(hours: i8) -> Result<Self, time::error::ComponentRange> {
        Ok(Self::new(UtcOffset::from_hms(hours, 0, 0)?))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hourly,
    QuarterHour,
}

/// Lookup key into a dataset at its native granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeKey {
    Hour(u8),
    Quarter(DemandPeriod),
}

impl TimeKey {
    pub fn hour(self) -> u8 {
        match self {
            TimeKey::Hour(h) => h,
            TimeKey::Quarter(p) => p.hour(),
        }
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeKey::Hour(h) => write!(f, "hour {h:02}"),
            TimeKey::Quarter(p) => write!(f, "period {p}"),
        }
    }
}

pub fn key_at(at: OffsetDateTime, granularity: Granularity) -> TimeKey {
    let hour = at.hour();
    match granularity {
        Granularity::Hourly => TimeKey::Hour(hour),
        Granularity::QuarterHour => {
            DemandPeriod::new(hour, at.minute() / 15).map_or(TimeKey::Hour(hour), TimeKey::Quarter)
        }
    }
}

pub fn current_key(clock: &dyn Clock, granularity: Granularity) -> TimeKey {
    key_at(clock.now(), granularity)
}
