use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::calendar::{DayKey, ReferenceCalendar};
use super::domain::{
    AttendanceRecord, BadgeProgress, CheckInOutcome, NewUser, Pagination, RankingEntry,
    RankingOrder, RankingPage, User, UserId, UserStats,
};
use super::repository::{AttendanceStore, StoreError};
use crate::badges::{
    BadgeAwardLedger, BadgeCatalog, BadgeDefinition, BadgeEvaluator, BadgeStats, BadgeStore,
    DayContext, DaySignals, NoDaySignals,
};
use crate::config::DEFAULT_LOCATION;

pub const RECENT_ATTENDANCE_LIMIT: usize = 30;
pub const MAX_PAGE_SIZE: usize = 100;

/// Service composing the attendance store, the badge evaluator and the award ledger.
pub struct AttendanceService<S, B> {
    store: Arc<S>,
    awards: BadgeAwardLedger<B>,
    evaluator: BadgeEvaluator,
    calendar: ReferenceCalendar,
    signals: Arc<dyn DaySignals>,
    default_location: String,
}

impl<S, B> AttendanceService<S, B>
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    pub fn new(store: Arc<S>, badges: Arc<B>, calendar: ReferenceCalendar) -> Self {
        Self {
            store,
            awards: BadgeAwardLedger::new(badges),
            evaluator: BadgeEvaluator::new(Arc::new(BadgeCatalog::standard())),
            calendar,
            signals: Arc::new(NoDaySignals),
            default_location: DEFAULT_LOCATION.to_string(),
        }
    }

    pub fn with_signals(mut self, signals: Arc<dyn DaySignals>) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_default_location(mut self, location: impl Into<String>) -> Self {
        self.default_location = location.into();
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<BadgeCatalog>) -> Self {
        self.evaluator = BadgeEvaluator::new(catalog);
        self
    }

    pub fn calendar(&self) -> &ReferenceCalendar {
        &self.calendar
    }

    pub fn catalog(&self) -> &BadgeCatalog {
        self.evaluator.catalog()
    }

    /// Writes catalog metadata to the badge store. Run once before serving check-ins.
    pub fn seed_badge_catalog(&self) -> Result<(), AttendanceError> {
        self.awards.seed_catalog(self.evaluator.catalog())?;
        Ok(())
    }

    pub fn register_user(
        &self,
        name: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AttendanceError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(AttendanceError::InvalidInput(
                "name and email are required".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AttendanceError::InvalidInput(format!(
                "'{email}' is not an email address"
            )));
        }

        let user = self
            .store
            .create_user(
                NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                },
                now,
            )
            .map_err(|err| match err {
                StoreError::Conflict => AttendanceError::EmailInUse,
                other => AttendanceError::Storage(other),
            })?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Records today's attendance, advances the streak and grants any badges it unlocks.
    ///
    /// Badge bookkeeping runs after the attendance and aggregates are committed; a failure
    /// there is logged and yields an empty `new_badges` instead of failing the check-in.
    pub fn register_check_in(
        &self,
        user_id: &UserId,
        instant: DateTime<Utc>,
        location: Option<&str>,
    ) -> Result<CheckInOutcome, AttendanceError> {
        let today = self.calendar.day_key(instant);
        let user = self.require_user(user_id)?;

        if self.store.attendance_on(user_id, today)?.is_some() {
            debug!(user_id = %user_id, day = %today, "duplicate check-in rejected");
            return Err(AttendanceError::DuplicateCheckIn);
        }

        let previous = self.store.latest_attendance(user_id)?;
        let streak = self.next_streak(&user, previous.as_ref(), today)?;

        let record = AttendanceRecord {
            user_id: user_id.clone(),
            date: today,
            check_in: self.calendar.local(instant),
            location: self.resolve_location(location),
        };
        let (attendance, updated) = self
            .store
            .record_check_in(record, streak)
            .map_err(|err| match err {
                StoreError::Conflict => AttendanceError::DuplicateCheckIn,
                StoreError::NotFound => AttendanceError::UserNotFound(user_id.clone()),
                other => AttendanceError::Storage(other),
            })?;

        let new_badges = match self.award_badges(&updated, &attendance, instant) {
            Ok(badges) => badges,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "badge evaluation failed after check-in");
                Vec::new()
            }
        };

        info!(
            user_id = %user_id,
            day = %today,
            current_streak = updated.current_streak,
            new_badges = new_badges.len(),
            "check-in registered"
        );

        Ok(CheckInOutcome {
            attendance,
            current_streak: updated.current_streak,
            max_streak: updated.max_streak,
            total_days: updated.total_days,
            new_badges,
        })
    }

    /// Zeroes the streak of every user who missed yesterday. Returns how many were reset.
    pub fn sweep_broken_streaks(&self, as_of: DateTime<Utc>) -> Result<usize, AttendanceError> {
        let yesterday = self.calendar.yesterday(as_of);
        let mut reset = 0;

        for user in self.store.list_users()? {
            if user.current_streak == 0 {
                continue;
            }
            if self.store.clear_stale_streak(&user.id, yesterday)? {
                debug!(user_id = %user.id, previous_streak = user.current_streak, "streak reset");
                reset += 1;
            }
        }

        info!(reset, yesterday = %yesterday, "streak sweep finished");
        Ok(reset)
    }

    pub fn stats(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<UserStats, AttendanceError> {
        let user = self.require_user(user_id)?;
        let today = self.calendar.day_key(now);
        let (weekly_days, monthly_days) = self.window_counts(user_id, today)?;

        let mut recent_attendances = self.store.attendance_between(user_id, DayKey::MIN, today)?;
        recent_attendances.truncate(RECENT_ATTENDANCE_LIMIT);

        let mut users = self.store.list_users()?;
        sort_users(&mut users, RankingOrder::TotalDays);
        let rank = users
            .iter()
            .position(|candidate| candidate.id == user.id)
            .map_or(users.len(), |index| index + 1);

        Ok(UserStats {
            current_streak: user.current_streak,
            max_streak: user.max_streak,
            total_days: user.total_days,
            weekly_days,
            monthly_days,
            rank,
            recent_attendances,
        })
    }

    /// Every attendance of the user, newest first.
    pub fn history(&self, user_id: &UserId) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        self.require_user(user_id)?;
        Ok(self
            .store
            .attendance_between(user_id, DayKey::MIN, DayKey::MAX)?)
    }

    pub fn history_between(
        &self,
        user_id: &UserId,
        start: DayKey,
        end: DayKey,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        if start > end {
            return Err(AttendanceError::InvalidInput(format!(
                "start {start} is after end {end}"
            )));
        }
        self.require_user(user_id)?;
        Ok(self.store.attendance_between(user_id, start, end)?)
    }

    pub fn ranking(
        &self,
        order: RankingOrder,
        page: usize,
        page_size: usize,
    ) -> Result<RankingPage, AttendanceError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let mut users = self.store.list_users()?;
        sort_users(&mut users, order);

        let total_count = users.len();
        let offset = (page - 1).saturating_mul(page_size);
        let entries = users
            .into_iter()
            .enumerate()
            .skip(offset)
            .take(page_size)
            .map(|(index, user)| RankingEntry {
                position: index + 1,
                id: user.id,
                name: user.name,
                current_streak: user.current_streak,
                max_streak: user.max_streak,
                total_days: user.total_days,
            })
            .collect();

        Ok(RankingPage {
            users: entries,
            pagination: Pagination {
                page,
                page_size,
                total_count,
                total_pages: total_count.div_ceil(page_size),
            },
        })
    }

    /// Every catalog badge with ownership and progress computed from live stats.
    pub fn badges(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<BadgeProgress>, AttendanceError> {
        let user = self.require_user(user_id)?;
        let today = self.calendar.day_key(now);
        let (weekly_days, monthly_days) = self.window_counts(user_id, today)?;
        let stats = BadgeStats {
            current_streak: user.current_streak,
            total_days: user.total_days,
            weekly_days,
            monthly_days,
        };
        let owned = self.awards.owned(user_id)?;

        Ok(self
            .evaluator
            .progress(&stats)
            .into_iter()
            .map(|(badge, outcome)| {
                let earned_at = owned.get(badge.id).copied();
                BadgeProgress {
                    badge: badge.summary(),
                    earned: earned_at.is_some(),
                    earned_at,
                    progress: if earned_at.is_some() {
                        100
                    } else {
                        outcome.progress
                    },
                }
            })
            .collect())
    }

    fn require_user(&self, user_id: &UserId) -> Result<User, AttendanceError> {
        self.store
            .fetch_user(user_id)?
            .ok_or_else(|| AttendanceError::UserNotFound(user_id.clone()))
    }

    fn resolve_location(&self, location: Option<&str>) -> String {
        location
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(self.default_location.as_str())
            .to_string()
    }

    fn next_streak(
        &self,
        user: &User,
        previous: Option<&AttendanceRecord>,
        today: DayKey,
    ) -> Result<u32, StoreError> {
        let yesterday = today.previous();
        match previous {
            Some(record) if record.date == yesterday && user.current_streak > 0 => {
                Ok(user.current_streak.saturating_add(1))
            }
            // A sweep raced ahead of us and cleared a streak that is still alive.
            Some(record) if record.date == yesterday => {
                Ok(self.consecutive_run(&user.id, yesterday)?.saturating_add(1))
            }
            _ => Ok(1),
        }
    }

    /// Length of the unbroken run of attendance days ending on `end`.
    fn consecutive_run(&self, user_id: &UserId, end: DayKey) -> Result<u32, StoreError> {
        let history = self.store.attendance_between(user_id, DayKey::MIN, end)?;
        let mut expected = end;
        let mut run = 0u32;
        for record in history {
            if record.date != expected {
                break;
            }
            run = run.saturating_add(1);
            expected = expected.previous();
        }
        Ok(run)
    }

    fn window_counts(&self, user_id: &UserId, today: DayKey) -> Result<(u32, u32), StoreError> {
        let weekly = self
            .store
            .count_between(user_id, today.week_start(), today)?;
        let monthly = self
            .store
            .count_between(user_id, today.month_start(), today)?;
        Ok((weekly, monthly))
    }

    fn award_badges(
        &self,
        user: &User,
        attendance: &AttendanceRecord,
        earned_at: DateTime<Utc>,
    ) -> Result<Vec<BadgeDefinition>, StoreError> {
        let today = attendance.date;
        let (weekly_days, monthly_days) = self.window_counts(&user.id, today)?;
        let stats = BadgeStats {
            current_streak: user.current_streak,
            total_days: user.total_days,
            weekly_days,
            monthly_days,
        };
        let context = DayContext {
            day: today,
            arrival: attendance.check_in.time(),
            location: attendance.location.clone(),
            is_holiday: self.signals.is_holiday(today),
            is_rainy: self.signals.is_rainy(today),
        };

        let owned: HashSet<String> = self.awards.owned(&user.id)?.into_keys().collect();
        let candidates = self.evaluator.newly_earned(&stats, &context, &owned);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        self.awards
            .award_new_badges(&user.id, &candidates, earned_at)
    }
}

/// Aggregate descending, then name ascending.
fn sort_users(users: &mut [User], order: RankingOrder) {
    users.sort_by(|left, right| {
        order
            .key(right)
            .cmp(&order.key(left))
            .then_with(|| left.name.cmp(&right.name))
            .then_with(|| left.id.cmp(&right.id))
    });
}

/// Error raised by the attendance service.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("attendance already registered for today")]
    DuplicateCheckIn,
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("email already in use")]
    EmailInUse,
    #[error("{0}")]
    InvalidInput(String),
    #[error("storage failure")]
    Storage(#[from] StoreError),
}
