use crate::cli::ServeArgs;
use crate::infra::{build_attendance_service, ApiService, AppState};
use crate::routes::with_attendance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use streakboard::attendance::MemoryStore;
use streakboard::config::AppConfig;
use streakboard::error::AppError;
use streakboard::telemetry;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryStore::default());
    let service = Arc::new(build_attendance_service(&config.attendance, store)?);

    if config.sweep.cron_secret.is_none() {
        warn!("CRON_SECRET_KEY is not set; the sweep endpoint will reject every request");
    }
    if let Some(period) = config.sweep.interval {
        spawn_streak_sweep(service.clone(), period);
    }

    let app = with_attendance_routes(service, config.sweep.cron_secret.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        utc_offset_minutes = config.attendance.utc_offset_minutes,
        "streakboard attendance service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs the streak sweep on a fixed period for deployments without an external scheduler.
fn spawn_streak_sweep(service: Arc<ApiService>, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "scheduled streak sweep enabled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = service.sweep_broken_streaks(Utc::now()) {
                warn!(error = %err, "scheduled streak sweep failed");
            }
        }
    })
}
