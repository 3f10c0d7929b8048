use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::attendance::calendar::DayKey;

/// Badge family, as exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeKind {
    Streak,
    TotalDays,
    Consistency,
    Special,
}

impl BadgeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Streak => "STREAK",
            Self::TotalDays => "TOTAL_DAYS",
            Self::Consistency => "CONSISTENCY",
            Self::Special => "SPECIAL",
        }
    }
}

/// Counters a rule may compare against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadgeStats {
    pub current_streak: u32,
    pub total_days: u32,
    pub weekly_days: u32,
    pub monthly_days: u32,
}

/// Facts about the check-in being evaluated. Only available at check-in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayContext {
    pub day: DayKey,
    pub arrival: NaiveTime,
    pub location: String,
    pub is_holiday: bool,
    pub is_rainy: bool,
}

/// One-off conditions checked against the day of the check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCondition {
    Weekday(Weekday),
    Weekend,
    Holiday,
    RainyDay,
    /// Local arrival at or before `hour:minute` (the whole minute counts).
    ArrivalNoLaterThan {
        hour: u32,
        minute: u32,
    },
    LocationIs(&'static str),
}

impl DayCondition {
    pub fn holds(&self, day: &DayContext) -> bool {
        match *self {
            Self::Weekday(weekday) => day.day.weekday() == weekday,
            Self::Weekend => day.day.is_weekend(),
            Self::Holiday => day.is_holiday,
            Self::RainyDay => day.is_rainy,
            Self::ArrivalNoLaterThan { hour, minute } => {
                (day.arrival.hour(), day.arrival.minute()) <= (hour, minute)
            }
            Self::LocationIs(name) => day.location.trim() == name,
        }
    }
}

/// Predicate shapes available to catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRule {
    StreakAtLeast(u32),
    TotalDaysAtLeast(u32),
    WeeklyDaysAtLeast(u32),
    MonthlyDaysAtLeast(u32),
    DayEvent(DayCondition),
}

/// Whether a rule is met and how far along the user is (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOutcome {
    pub satisfied: bool,
    pub progress: u8,
}

impl RuleOutcome {
    fn counter(value: u32, threshold: u32) -> Self {
        Self {
            satisfied: value >= threshold,
            progress: ratio_progress(value, threshold),
        }
    }

    fn binary(satisfied: bool) -> Self {
        Self {
            satisfied,
            progress: if satisfied { 100 } else { 0 },
        }
    }
}

impl BadgeRule {
    pub const fn kind(&self) -> BadgeKind {
        match self {
            Self::StreakAtLeast(_) => BadgeKind::Streak,
            Self::TotalDaysAtLeast(_) => BadgeKind::TotalDays,
            Self::WeeklyDaysAtLeast(_) | Self::MonthlyDaysAtLeast(_) => BadgeKind::Consistency,
            Self::DayEvent(_) => BadgeKind::Special,
        }
    }

    pub const fn threshold(&self) -> u32 {
        match self {
            Self::StreakAtLeast(n)
            | Self::TotalDaysAtLeast(n)
            | Self::WeeklyDaysAtLeast(n)
            | Self::MonthlyDaysAtLeast(n) => *n,
            Self::DayEvent(_) => 1,
        }
    }

    /// Day events are unsatisfied without a day context; they cannot be checked after the fact.
    pub fn evaluate(&self, stats: &BadgeStats, day: Option<&DayContext>) -> RuleOutcome {
        match self {
            Self::StreakAtLeast(n) => RuleOutcome::counter(stats.current_streak, *n),
            Self::TotalDaysAtLeast(n) => RuleOutcome::counter(stats.total_days, *n),
            Self::WeeklyDaysAtLeast(n) => RuleOutcome::counter(stats.weekly_days, *n),
            Self::MonthlyDaysAtLeast(n) => RuleOutcome::counter(stats.monthly_days, *n),
            Self::DayEvent(condition) => {
                RuleOutcome::binary(day.map(|day| condition.holds(day)).unwrap_or(false))
            }
        }
    }
}

fn ratio_progress(value: u32, threshold: u32) -> u8 {
    if threshold == 0 {
        return 100;
    }
    let pct = (f64::from(value) / f64::from(threshold) * 100.0).round();
    pct.min(100.0) as u8
}
