use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

use crate::config::{AttendanceConfig, ConfigError};

/// Local calendar date in the reference timezone; the unit of attendance uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub const MIN: DayKey = DayKey(NaiveDate::MIN);
    pub const MAX: DayKey = DayKey(NaiveDate::MAX);

    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub const fn date(self) -> NaiveDate {
        self.0
    }

    pub fn previous(self) -> Self {
        self.0.pred_opt().map(Self).unwrap_or(self)
    }

    pub fn next(self) -> Self {
        self.0.succ_opt().map(Self).unwrap_or(self)
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    pub fn is_weekend(self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// First day of the calendar week; weeks run Sunday through Saturday.
    pub fn week_start(self) -> Self {
        let offset = u64::from(self.weekday().num_days_from_sunday());
        self.0
            .checked_sub_days(Days::new(offset))
            .map(Self)
            .unwrap_or(self)
    }

    pub fn month_start(self) -> Self {
        self.0.with_day(1).map(Self).unwrap_or(self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a YYYY-MM-DD date")]
pub struct DayKeyParseError(pub String);

impl FromStr for DayKey {
    type Err = DayKeyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| DayKeyParseError(raw.to_string()))
    }
}

impl From<NaiveDate> for DayKey {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

/// Converts instants into day-keys for a fixed reference offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceCalendar {
    offset: FixedOffset,
}

impl ReferenceCalendar {
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    pub fn from_config(config: &AttendanceConfig) -> Result<Self, ConfigError> {
        config.utc_offset().map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The instant expressed as local wall-clock time.
    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    pub fn day_key(&self, instant: DateTime<Utc>) -> DayKey {
        DayKey(self.local(instant).date_naive())
    }

    pub fn yesterday(&self, instant: DateTime<Utc>) -> DayKey {
        self.day_key(instant).previous()
    }

    /// The instant at which local wall-clock `time` occurs on `day`.
    pub fn instant_at(&self, day: DayKey, time: NaiveTime) -> DateTime<Utc> {
        let local = day.date().and_time(time);
        let utc = local - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }
}

/// Human-facing description of a day relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    Today,
    Yesterday,
    On(DayKey),
}

impl RelativeDay {
    pub fn describe(day: DayKey, today: DayKey) -> Self {
        if day == today {
            Self::Today
        } else if day == today.previous() {
            Self::Yesterday
        } else {
            Self::On(day)
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Today => "Hoje".to_string(),
            Self::Yesterday => "Ontem".to_string(),
            Self::On(day) => day.date().format("%d/%m/%Y").to_string(),
        }
    }
}
