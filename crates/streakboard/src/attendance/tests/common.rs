use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::attendance::calendar::{DayKey, ReferenceCalendar};
use crate::attendance::domain::{AttendanceRecord, NewUser, User, UserId};
use crate::attendance::memory::MemoryStore;
use crate::attendance::repository::{AttendanceStore, StoreError};
use crate::attendance::service::AttendanceService;
use crate::badges::{BadgeAward, BadgeStore, BadgeSummary};

pub(super) type MemoryService = AttendanceService<MemoryStore, MemoryStore>;

pub(super) fn calendar() -> ReferenceCalendar {
    ReferenceCalendar::from_offset_minutes(-180).expect("valid offset")
}

fn local_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("valid offset")
}

/// UTC instant for a São Paulo wall-clock time.
pub(super) fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    local_offset()
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

/// Mid-morning of the given local date.
pub(super) fn morning(date: NaiveDate) -> DateTime<Utc> {
    local_offset()
        .from_local_datetime(&date.and_hms_opt(9, 30, 0).expect("valid time"))
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

pub(super) fn day(year: i32, month: u32, day: u32) -> DayKey {
    DayKey::from_ymd(year, month, day).expect("valid date")
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = AttendanceService::new(store.clone(), store.clone(), calendar());
    service.seed_badge_catalog().expect("catalog seeds");
    (service, store)
}

pub(super) fn register(service: &MemoryService, name: &str) -> User {
    let email = format!("{}@example.com", name.to_ascii_lowercase());
    service
        .register_user(name, &email, local(2025, 1, 2, 10, 0))
        .expect("user registers")
}

/// Checks in on each of `count` consecutive days starting at `start`.
pub(super) fn check_in_days(service: &MemoryService, user: &UserId, start: NaiveDate, count: u64) {
    for offset in 0..count {
        let date = start + chrono::Days::new(offset);
        service
            .register_check_in(user, morning(date), None)
            .expect("check-in succeeds");
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json body")
}

/// Attendance store whose every call fails as if the database were offline.
pub(super) struct UnavailableStore;

fn offline() -> StoreError {
    StoreError::Unavailable("database offline".to_string())
}

impl AttendanceStore for UnavailableStore {
    fn create_user(&self, _user: NewUser, _created_at: DateTime<Utc>) -> Result<User, StoreError> {
        Err(offline())
    }

    fn fetch_user(&self, _id: &UserId) -> Result<Option<User>, StoreError> {
        Err(offline())
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Err(offline())
    }

    fn attendance_on(
        &self,
        _user: &UserId,
        _day: DayKey,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Err(offline())
    }

    fn latest_attendance(&self, _user: &UserId) -> Result<Option<AttendanceRecord>, StoreError> {
        Err(offline())
    }

    fn attendance_between(
        &self,
        _user: &UserId,
        _start: DayKey,
        _end: DayKey,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Err(offline())
    }

    fn count_between(&self, _user: &UserId, _start: DayKey, _end: DayKey) -> Result<u32, StoreError> {
        Err(offline())
    }

    fn record_check_in(
        &self,
        _record: AttendanceRecord,
        _current_streak: u32,
    ) -> Result<(AttendanceRecord, User), StoreError> {
        Err(offline())
    }

    fn clear_stale_streak(&self, _user: &UserId, _yesterday: DayKey) -> Result<bool, StoreError> {
        Err(offline())
    }
}

/// Wraps [`MemoryStore`] to replay two awkward interleavings of a check-in.
///
/// With `hide_existing` set, the duplicate lookup never sees today's row, as when a
/// concurrent request commits between the lookup and the write. While `fail_write` is
/// set, the next check-in write fails once without touching the inner store.
#[derive(Default)]
pub(super) struct InterleavedStore {
    pub(super) inner: MemoryStore,
    pub(super) hide_existing: bool,
    pub(super) fail_write: AtomicBool,
}

impl AttendanceStore for InterleavedStore {
    fn create_user(&self, user: NewUser, created_at: DateTime<Utc>) -> Result<User, StoreError> {
        self.inner.create_user(user, created_at)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.inner.fetch_user(id)
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.inner.list_users()
    }

    fn attendance_on(
        &self,
        user: &UserId,
        day: DayKey,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        if self.hide_existing {
            return Ok(None);
        }
        self.inner.attendance_on(user, day)
    }

    fn latest_attendance(&self, user: &UserId) -> Result<Option<AttendanceRecord>, StoreError> {
        self.inner.latest_attendance(user)
    }

    fn attendance_between(
        &self,
        user: &UserId,
        start: DayKey,
        end: DayKey,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.inner.attendance_between(user, start, end)
    }

    fn count_between(&self, user: &UserId, start: DayKey, end: DayKey) -> Result<u32, StoreError> {
        self.inner.count_between(user, start, end)
    }

    fn record_check_in(
        &self,
        record: AttendanceRecord,
        current_streak: u32,
    ) -> Result<(AttendanceRecord, User), StoreError> {
        if self.fail_write.swap(false, Ordering::SeqCst) {
            return Err(offline());
        }
        self.inner.record_check_in(record, current_streak)
    }

    fn clear_stale_streak(&self, user: &UserId, yesterday: DayKey) -> Result<bool, StoreError> {
        self.inner.clear_stale_streak(user, yesterday)
    }
}

/// Badge store that accepts the catalog but cannot read or write awards.
pub(super) struct FailingBadgeStore;

impl BadgeStore for FailingBadgeStore {
    fn seed_badges(&self, _badges: &[BadgeSummary]) -> Result<(), StoreError> {
        Ok(())
    }

    fn awards_for(&self, _user: &UserId) -> Result<Vec<BadgeAward>, StoreError> {
        Err(offline())
    }

    fn insert_award(&self, _award: BadgeAward) -> Result<(), StoreError> {
        Err(offline())
    }
}
