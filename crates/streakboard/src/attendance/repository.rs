use chrono::{DateTime, Utc};

use super::calendar::DayKey;
use super::domain::{AttendanceRecord, NewUser, User, UserId};

/// Storage abstraction for users and their check-ins.
///
/// Implementations must enforce two constraints: one attendance per `(user, day)`
/// and one user per email. Violations surface as [`StoreError::Conflict`].
pub trait AttendanceStore: Send + Sync {
    fn create_user(&self, user: NewUser, created_at: DateTime<Utc>) -> Result<User, StoreError>;
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;
    fn list_users(&self) -> Result<Vec<User>, StoreError>;

    fn attendance_on(
        &self,
        user: &UserId,
        day: DayKey,
    ) -> Result<Option<AttendanceRecord>, StoreError>;
    fn latest_attendance(&self, user: &UserId) -> Result<Option<AttendanceRecord>, StoreError>;
    /// Records with `start <= date <= end`, newest first.
    fn attendance_between(
        &self,
        user: &UserId,
        start: DayKey,
        end: DayKey,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;
    fn count_between(&self, user: &UserId, start: DayKey, end: DayKey) -> Result<u32, StoreError>;

    /// Inserts the attendance and, in the same write, sets `current_streak`, raises
    /// `max_streak` if needed and bumps `total_days`. Either both land or neither does.
    fn record_check_in(
        &self,
        record: AttendanceRecord,
        current_streak: u32,
    ) -> Result<(AttendanceRecord, User), StoreError>;
    /// Zeroes `current_streak` unless the user has an attendance on `yesterday` or later.
    /// Returns whether the user was reset.
    fn clear_stale_streak(&self, user: &UserId, yesterday: DayKey) -> Result<bool, StoreError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
