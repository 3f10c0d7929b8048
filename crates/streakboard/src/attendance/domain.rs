use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::calendar::DayKey;
use crate::badges::{BadgeDefinition, BadgeSummary};

/// Identifier wrapper for community members.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Member identity plus the running attendance aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_days: u32,
}

/// Registration payload accepted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// One check-in; unique per `(user_id, date)` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub user_id: UserId,
    pub date: DayKey,
    pub check_in: DateTime<FixedOffset>,
    pub location: String,
}

/// Result of a successful check-in, including badges unlocked by it.
#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub attendance: AttendanceRecord,
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_days: u32,
    pub new_badges: Vec<BadgeDefinition>,
}

/// Aggregates plus the calendar-window counts used by consistency badges.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_days: u32,
    pub weekly_days: u32,
    pub monthly_days: u32,
    pub rank: usize,
    pub recent_attendances: Vec<AttendanceRecord>,
}

/// Aggregate used to order the community ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingOrder {
    #[default]
    #[serde(alias = "currentStreak")]
    CurrentStreak,
    #[serde(alias = "maxStreak")]
    MaxStreak,
    #[serde(alias = "totalDays")]
    TotalDays,
}

impl RankingOrder {
    pub fn key(self, user: &User) -> u32 {
        match self {
            Self::CurrentStreak => user.current_streak,
            Self::MaxStreak => user.max_streak,
            Self::TotalDays => user.total_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub position: usize,
    pub id: UserId,
    pub name: String,
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingPage {
    pub users: Vec<RankingEntry>,
    pub pagination: Pagination,
}

/// Catalog badge annotated with the user's ownership and progress towards it.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeProgress {
    #[serde(flatten)]
    pub badge: BadgeSummary,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
    pub progress: u8,
}
