use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use super::calendar::{DayKey, RelativeDay};
use super::domain::{AttendanceRecord, CheckInOutcome, RankingOrder, UserId};
use super::repository::AttendanceStore;
use super::service::{AttendanceError, AttendanceService};
use crate::badges::{BadgeStore, BadgeSummary};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Shared secret expected in the `Authorization: Bearer` header of the sweep endpoint.
#[derive(Debug, Clone, Default)]
pub struct CronSecret(pub Option<Arc<str>>);

impl CronSecret {
    fn authorizes(&self, headers: &HeaderMap) -> bool {
        let Some(secret) = self.0.as_deref() else {
            return false;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token.trim() == secret)
    }
}

/// Router builder exposing registration, check-in, query and sweep endpoints.
pub fn attendance_router<S, B>(
    service: Arc<AttendanceService<S, B>>,
    cron_secret: Option<String>,
) -> Router
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    let secret = CronSecret(
        cron_secret
            .filter(|value| !value.trim().is_empty())
            .map(Arc::from),
    );

    Router::new()
        .route("/api/v1/users", post(register_user_handler::<S, B>))
        .route("/api/v1/attendance", post(check_in_handler::<S, B>))
        .route(
            "/api/v1/users/:user_id/attendance",
            get(history_handler::<S, B>),
        )
        .route("/api/v1/users/:user_id/stats", get(stats_handler::<S, B>))
        .route(
            "/api/v1/users/:user_id/attendances",
            get(range_handler::<S, B>),
        )
        .route("/api/v1/users/:user_id/badges", get(badges_handler::<S, B>))
        .route("/api/v1/ranking", get(ranking_handler::<S, B>))
        .route("/api/v1/cron/check-streaks", get(sweep_handler::<S, B>))
        .layer(Extension(secret))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub order_by: Option<RankingOrder>,
}

/// Attendance record plus a friendly label relative to the local today.
#[derive(Debug, Serialize)]
pub struct AttendanceView {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub relative_day: String,
}

impl AttendanceView {
    fn new(record: AttendanceRecord, today: DayKey) -> Self {
        let relative_day = RelativeDay::describe(record.date, today).label();
        Self {
            record,
            relative_day,
        }
    }

    fn list(records: Vec<AttendanceRecord>, today: DayKey) -> Vec<Self> {
        records
            .into_iter()
            .map(|record| Self::new(record, today))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct CheckInView {
    pub attendance: AttendanceView,
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_days: u32,
    pub new_badges: Vec<BadgeSummary>,
}

impl CheckInView {
    fn new(outcome: CheckInOutcome, today: DayKey) -> Self {
        Self {
            attendance: AttendanceView::new(outcome.attendance, today),
            current_streak: outcome.current_streak,
            max_streak: outcome.max_streak,
            total_days: outcome.total_days,
            new_badges: outcome
                .new_badges
                .iter()
                .map(|badge| badge.summary())
                .collect(),
        }
    }
}

pub(crate) async fn register_user_handler<S, B>(
    State(service): State<Arc<AttendanceService<S, B>>>,
    Json(request): Json<RegisterUserRequest>,
) -> Response
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    match service.register_user(&request.name, &request.email, Utc::now()) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn check_in_handler<S, B>(
    State(service): State<Arc<AttendanceService<S, B>>>,
    Json(request): Json<CheckInRequest>,
) -> Response
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    let now = Utc::now();
    let today = service.calendar().day_key(now);
    match service.register_check_in(&request.user_id, now, request.location.as_deref()) {
        Ok(outcome) => (StatusCode::OK, Json(CheckInView::new(outcome, today))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn history_handler<S, B>(
    State(service): State<Arc<AttendanceService<S, B>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    let now = Utc::now();
    let today = service.calendar().day_key(now);
    let user_id = UserId(user_id);

    let result = service
        .history(&user_id)
        .and_then(|history| Ok((history, service.stats(&user_id, now)?)));
    match result {
        Ok((history, stats)) => {
            let payload = json!({
                "history": AttendanceView::list(history, today),
                "stats": stats,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn stats_handler<S, B>(
    State(service): State<Arc<AttendanceService<S, B>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    match service.stats(&UserId(user_id), Utc::now()) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn range_handler<S, B>(
    State(service): State<Arc<AttendanceService<S, B>>>,
    Path(user_id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Response
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    let (start, end) = match parse_range(&range) {
        Ok(bounds) => bounds,
        Err(err) => return err.into_response(),
    };
    let today = service.calendar().day_key(Utc::now());

    match service.history_between(&UserId(user_id), start, end) {
        Ok(records) => {
            let payload = json!({ "attendances": AttendanceView::list(records, today) });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn badges_handler<S, B>(
    State(service): State<Arc<AttendanceService<S, B>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    match service.badges(&UserId(user_id), Utc::now()) {
        Ok(badges) => (StatusCode::OK, Json(badges)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn ranking_handler<S, B>(
    State(service): State<Arc<AttendanceService<S, B>>>,
    Query(query): Query<RankingQuery>,
) -> Response
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let order = query.order_by.unwrap_or_default();

    match service.ranking(order, page, page_size) {
        Ok(ranking) => (StatusCode::OK, Json(ranking)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn sweep_handler<S, B>(
    State(service): State<Arc<AttendanceService<S, B>>>,
    Extension(secret): Extension<CronSecret>,
    headers: HeaderMap,
) -> Response
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    if !secret.authorizes(&headers) {
        warn!("rejected unauthorized streak sweep request");
        let payload = json!({ "error": "unauthorized" });
        return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
    }

    match service.sweep_broken_streaks(Utc::now()) {
        Ok(updated_count) => {
            let payload = json!({
                "success": true,
                "message": format!("{updated_count} streaks reset"),
                "updated_count": updated_count,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

fn parse_range(range: &RangeQuery) -> Result<(DayKey, DayKey), AttendanceError> {
    let parse = |label: &str, raw: Option<&String>| -> Result<DayKey, AttendanceError> {
        let raw = raw.ok_or_else(|| AttendanceError::InvalidInput(format!("{label} is required")))?;
        raw.parse::<DayKey>()
            .map_err(|err| AttendanceError::InvalidInput(err.to_string()))
    };
    Ok((
        parse("start", range.start.as_ref())?,
        parse("end", range.end.as_ref())?,
    ))
}

impl IntoResponse for AttendanceError {
    fn into_response(self) -> Response {
        let status = match &self {
            AttendanceError::DuplicateCheckIn | AttendanceError::EmailInUse => StatusCode::CONFLICT,
            AttendanceError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Storage(source) => {
                error!(error = %source, "attendance storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
