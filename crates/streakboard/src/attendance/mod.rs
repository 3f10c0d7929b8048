//! Daily check-ins, streak bookkeeping and the attendance HTTP surface.
//!
//! Every date comparison goes through [`calendar::ReferenceCalendar`], so "today",
//! "yesterday", the current week and the current month always mean local calendar
//! days in the configured reference offset.

pub mod calendar;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use calendar::{DayKey, DayKeyParseError, ReferenceCalendar, RelativeDay};
pub use domain::{
    AttendanceRecord, BadgeProgress, CheckInOutcome, NewUser, Pagination, RankingEntry,
    RankingOrder, RankingPage, User, UserId, UserStats,
};
pub use memory::MemoryStore;
pub use repository::{AttendanceStore, StoreError};
pub use router::{attendance_router, CronSecret};
pub use service::{AttendanceError, AttendanceService};
