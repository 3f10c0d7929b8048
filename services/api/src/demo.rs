use crate::infra::build_attendance_service;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::Args;
use std::sync::Arc;
use streakboard::attendance::{DayKey, MemoryStore};
use streakboard::badges::BadgeCatalog;
use streakboard::config::AttendanceConfig;
use streakboard::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Print the catalog as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// First check-in day (YYYY-MM-DD). Defaults to today in the reference timezone.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Number of consecutive days to check in.
    #[arg(long, default_value_t = 7)]
    pub(crate) days: u32,
    /// Local arrival time for every check-in (HH:MM).
    #[arg(long, default_value = "08:10", value_parser = parse_time)]
    pub(crate) arrival: NaiveTime,
    /// Location recorded on every check-in.
    #[arg(long)]
    pub(crate) location: Option<String>,
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|err| format!("failed to parse '{raw}' as HH:MM ({err})"))
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let catalog = BadgeCatalog::standard();

    if args.json {
        match serde_json::to_string_pretty(&catalog.summaries()) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Catalog unavailable as JSON: {err}"),
        }
        return Ok(());
    }

    println!("Badge catalog ({} badges)", catalog.badges().len());
    for badge in catalog.badges() {
        println!(
            "  {} {:<22} {:<14} {:<12} threshold {:>2}  {}",
            badge.icon,
            badge.name,
            badge.id,
            badge.kind().label(),
            badge.threshold(),
            badge.description
        );
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        start,
        days,
        arrival,
        location,
    } = args;

    let store = Arc::new(MemoryStore::default());
    let service = build_attendance_service(&AttendanceConfig::default(), store)?;
    let calendar = *service.calendar();
    let start = start
        .map(DayKey::new)
        .unwrap_or_else(|| calendar.day_key(Utc::now()));

    println!("Streakboard demo");
    let user = service.register_user(
        "Demo Member",
        "demo@streakboard.local",
        calendar.instant_at(start, arrival),
    )?;
    println!("  Registered {} ({})", user.name, user.id);

    let mut day = start;
    let mut last = start;
    for _ in 0..days {
        let outcome =
            service.register_check_in(&user.id, calendar.instant_at(day, arrival), location.as_deref())?;
        let badges: Vec<String> = outcome
            .new_badges
            .iter()
            .map(|badge| format!("{} {}", badge.icon, badge.name))
            .collect();
        println!(
            "  {} {:<9} streak {:>2}  max {:>2}  total {:>2}  {}",
            day,
            format!("{:?}", day.weekday()),
            outcome.current_streak,
            outcome.max_streak,
            outcome.total_days,
            if badges.is_empty() {
                String::new()
            } else {
                format!("new: {}", badges.join(", "))
            }
        );
        last = day;
        day = day.next();
    }

    let sweep_day = last.next().next();
    let midnight = NaiveTime::MIN;
    let reset = service.sweep_broken_streaks(calendar.instant_at(sweep_day, midnight))?;
    println!("\nSweep on {sweep_day} (missed {}): {reset} streak(s) reset", last.next());

    let as_of = calendar.instant_at(sweep_day, arrival);
    let stats = service.stats(&user.id, as_of)?;
    println!(
        "  Current streak {}  max streak {}  total days {}  rank #{}",
        stats.current_streak, stats.max_streak, stats.total_days, stats.rank
    );

    let earned: Vec<String> = service
        .badges(&user.id, as_of)?
        .into_iter()
        .filter(|entry| entry.earned)
        .map(|entry| format!("{} {}", entry.badge.icon, entry.badge.name))
        .collect();
    if earned.is_empty() {
        println!("  Badges earned: none");
    } else {
        println!("  Badges earned: {}", earned.join(", "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_replays_and_sweeps_without_errors() {
        let args = DemoArgs {
            start: NaiveDate::from_ymd_opt(2025, 3, 3),
            days: 5,
            arrival: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
            location: Some("Quincas".to_string()),
        };
        run_demo(args).expect("demo runs");
    }

    #[test]
    fn arrival_time_parses_hours_and_minutes() {
        assert_eq!(
            parse_time("07:45"),
            Ok(NaiveTime::from_hms_opt(7, 45, 0).expect("valid time"))
        );
        assert!(parse_time("7h45").is_err());
    }
}
