use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use streakboard::attendance::{AttendanceService, MemoryStore, ReferenceCalendar};
use streakboard::badges::HolidayCalendar;
use streakboard::config::AttendanceConfig;
use streakboard::error::AppError;

pub(crate) type ApiService = AttendanceService<MemoryStore, MemoryStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the attendance service over a single in-memory store and seeds the badge catalog.
pub(crate) fn build_attendance_service(
    config: &AttendanceConfig,
    store: Arc<MemoryStore>,
) -> Result<ApiService, AppError> {
    let calendar = ReferenceCalendar::from_config(config)?;
    let holidays = HolidayCalendar::new(config.holidays.iter().copied());

    let service = AttendanceService::new(store.clone(), store, calendar)
        .with_signals(Arc::new(holidays))
        .with_default_location(config.default_location.clone());
    service.seed_badge_catalog()?;
    Ok(service)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
