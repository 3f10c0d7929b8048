use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::calendar::DayKey;
use super::domain::{AttendanceRecord, NewUser, User, UserId};
use super::repository::{AttendanceStore, StoreError};
use crate::badges::{BadgeAward, BadgeStore, BadgeSummary};

/// Process-local store backing both the attendance and badge tables.
///
/// A single lock guards every table, so each trait call is atomic with respect to
/// the others. The map keys double as the uniqueness constraints.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    next_user: u64,
    users: BTreeMap<UserId, User>,
    emails: HashSet<String>,
    attendance: BTreeMap<(UserId, DayKey), AttendanceRecord>,
    badges: BTreeMap<String, BadgeSummary>,
    awards: BTreeMap<(UserId, String), BadgeAward>,
}

impl MemoryState {
    fn user_days(
        &self,
        user: &UserId,
        start: DayKey,
        end: DayKey,
    ) -> impl DoubleEndedIterator<Item = &AttendanceRecord> {
        self.attendance
            .range((user.clone(), start)..=(user.clone(), end))
            .map(|(_, record)| record)
    }
}

impl MemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    pub fn user_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.users.len())
    }

    pub fn attendance_count(&self, user: &UserId) -> Result<usize, StoreError> {
        Ok(self.lock()?.user_days(user, DayKey::MIN, DayKey::MAX).count())
    }

    pub fn award_count(&self, user: &UserId) -> Result<usize, StoreError> {
        let guard = self.lock()?;
        Ok(guard.awards.keys().filter(|(id, _)| id == user).count())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl AttendanceStore for MemoryStore {
    fn create_user(&self, user: NewUser, created_at: DateTime<Utc>) -> Result<User, StoreError> {
        let mut guard = self.lock()?;
        let email = normalize_email(&user.email);
        if guard.emails.contains(&email) {
            return Err(StoreError::Conflict);
        }

        guard.next_user += 1;
        let id = UserId(format!("user-{:06}", guard.next_user));
        let record = User {
            id: id.clone(),
            name: user.name.trim().to_string(),
            email: email.clone(),
            created_at,
            current_streak: 0,
            max_streak: 0,
            total_days: 0,
        };
        guard.emails.insert(email);
        guard.users.insert(id, record.clone());
        Ok(record)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    fn attendance_on(
        &self,
        user: &UserId,
        day: DayKey,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.attendance.get(&(user.clone(), day)).cloned())
    }

    fn latest_attendance(&self, user: &UserId) -> Result<Option<AttendanceRecord>, StoreError> {
        let guard = self.lock()?;
        let latest = guard.user_days(user, DayKey::MIN, DayKey::MAX).next_back();
        Ok(latest.cloned())
    }

    fn attendance_between(
        &self,
        user: &UserId,
        start: DayKey,
        end: DayKey,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }
        let guard = self.lock()?;
        Ok(guard.user_days(user, start, end).rev().cloned().collect())
    }

    fn count_between(&self, user: &UserId, start: DayKey, end: DayKey) -> Result<u32, StoreError> {
        if start > end {
            return Ok(0);
        }
        let guard = self.lock()?;
        let count = guard.user_days(user, start, end).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn record_check_in(
        &self,
        record: AttendanceRecord,
        current_streak: u32,
    ) -> Result<(AttendanceRecord, User), StoreError> {
        let mut guard = self.lock()?;
        let key = (record.user_id.clone(), record.date);
        if guard.attendance.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        let user = guard
            .users
            .get_mut(&record.user_id)
            .ok_or(StoreError::NotFound)?;
        user.current_streak = current_streak;
        user.max_streak = user.max_streak.max(current_streak);
        user.total_days = user.total_days.saturating_add(1);
        let user = user.clone();
        guard.attendance.insert(key, record.clone());
        Ok((record, user))
    }

    fn clear_stale_streak(&self, user: &UserId, yesterday: DayKey) -> Result<bool, StoreError> {
        let mut guard = self.lock()?;
        let recent = guard.user_days(user, yesterday, DayKey::MAX).next().is_some();
        let record = guard.users.get_mut(user).ok_or(StoreError::NotFound)?;
        if record.current_streak == 0 || recent {
            return Ok(false);
        }
        record.current_streak = 0;
        Ok(true)
    }
}

impl BadgeStore for MemoryStore {
    fn seed_badges(&self, badges: &[BadgeSummary]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        for badge in badges {
            guard.badges.insert(badge.id.clone(), badge.clone());
        }
        Ok(())
    }

    fn awards_for(&self, user: &UserId) -> Result<Vec<BadgeAward>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .awards
            .values()
            .filter(|award| &award.user_id == user)
            .cloned()
            .collect())
    }

    fn insert_award(&self, award: BadgeAward) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.badges.contains_key(&award.badge_id) {
            return Err(StoreError::NotFound);
        }
        let key = (award.user_id.clone(), award.badge_id.clone());
        if guard.awards.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        guard.awards.insert(key, award);
        Ok(())
    }
}
