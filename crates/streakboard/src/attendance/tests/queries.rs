use super::common::*;

use chrono::NaiveDate;

use crate::attendance::domain::{RankingOrder, UserId};
use crate::attendance::service::{AttendanceError, RECENT_ATTENDANCE_LIMIT};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

#[test]
fn stats_report_windows_and_rank_by_total_days() {
    let (service, _store) = build_service();
    let ana = register(&service, "Ana");
    let bia = register(&service, "Bia");
    let carla = register(&service, "Carla");

    check_in_days(&service, &ana.id, date(2025, 2, 26), 10);
    check_in_days(&service, &bia.id, date(2025, 2, 1), 12);
    check_in_days(&service, &carla.id, date(2025, 1, 1), 35);

    let stats = service
        .stats(&ana.id, local(2025, 3, 7, 18, 0))
        .expect("stats load");
    assert_eq!(stats.current_streak, 10);
    assert_eq!(stats.total_days, 10);
    // The week began on Sunday 2025-03-02.
    assert_eq!(stats.weekly_days, 6);
    assert_eq!(stats.monthly_days, 7);
    assert_eq!(stats.rank, 3);
    assert_eq!(stats.recent_attendances.len(), 10);
    assert_eq!(stats.recent_attendances[0].date, day(2025, 3, 7));

    let carla_stats = service
        .stats(&carla.id, local(2025, 3, 7, 18, 0))
        .expect("stats load");
    assert_eq!(carla_stats.rank, 1);
    assert_eq!(carla_stats.weekly_days, 0);
    assert_eq!(carla_stats.recent_attendances.len(), RECENT_ATTENDANCE_LIMIT);
    assert_eq!(carla_stats.recent_attendances[0].date, day(2025, 2, 4));
}

#[test]
fn history_is_newest_first_and_ranges_are_inclusive() {
    let (service, _store) = build_service();
    let user = register(&service, "Ana");
    check_in_days(&service, &user.id, date(2025, 3, 3), 5);

    let history = service.history(&user.id).expect("history loads");
    let days: Vec<_> = history.iter().map(|record| record.date).collect();
    assert_eq!(days.first(), Some(&day(2025, 3, 7)));
    assert_eq!(days.last(), Some(&day(2025, 3, 3)));

    let ranged = service
        .history_between(&user.id, day(2025, 3, 4), day(2025, 3, 6))
        .expect("range loads");
    let days: Vec<_> = ranged.iter().map(|record| record.date).collect();
    assert_eq!(days, vec![day(2025, 3, 6), day(2025, 3, 5), day(2025, 3, 4)]);
}

#[test]
fn inverted_range_is_rejected() {
    let (service, _store) = build_service();
    let user = register(&service, "Ana");

    match service.history_between(&user.id, day(2025, 3, 6), day(2025, 3, 4)) {
        Err(AttendanceError::InvalidInput(message)) => assert!(message.contains("2025-03-06")),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn queries_for_unknown_users_are_not_found() {
    let (service, _store) = build_service();
    let ghost = UserId("user-424242".to_string());

    assert!(matches!(
        service.history(&ghost),
        Err(AttendanceError::UserNotFound(_))
    ));
    assert!(matches!(
        service.stats(&ghost, local(2025, 3, 7, 9, 0)),
        Err(AttendanceError::UserNotFound(_))
    ));
    assert!(matches!(
        service.badges(&ghost, local(2025, 3, 7, 9, 0)),
        Err(AttendanceError::UserNotFound(_))
    ));
}

fn ranking_fixture() -> MemoryService {
    let (service, _store) = build_service();
    let ana = register(&service, "Ana");
    let bruno = register(&service, "Bruno");
    let caio = register(&service, "Caio");

    check_in_days(&service, &ana.id, date(2025, 3, 1), 2);
    check_in_days(&service, &ana.id, date(2025, 3, 5), 1);
    check_in_days(&service, &bruno.id, date(2025, 3, 3), 3);
    check_in_days(&service, &caio.id, date(2025, 3, 5), 1);
    service
}

fn ranked_names(service: &MemoryService, order: RankingOrder) -> Vec<String> {
    service
        .ranking(order, 1, 10)
        .expect("ranking loads")
        .users
        .into_iter()
        .map(|entry| entry.name)
        .collect()
}

#[test]
fn ranking_orders_by_requested_aggregate_then_name() {
    let service = ranking_fixture();

    assert_eq!(
        ranked_names(&service, RankingOrder::CurrentStreak),
        vec!["Bruno", "Ana", "Caio"]
    );
    assert_eq!(
        ranked_names(&service, RankingOrder::MaxStreak),
        vec!["Bruno", "Ana", "Caio"]
    );
    assert_eq!(
        ranked_names(&service, RankingOrder::TotalDays),
        vec!["Ana", "Bruno", "Caio"]
    );
}

#[test]
fn ranking_paginates_with_global_positions() {
    let service = ranking_fixture();

    let second = service
        .ranking(RankingOrder::CurrentStreak, 2, 2)
        .expect("ranking loads");
    assert_eq!(second.users.len(), 1);
    assert_eq!(second.users[0].name, "Caio");
    assert_eq!(second.users[0].position, 3);
    assert_eq!(second.pagination.total_count, 3);
    assert_eq!(second.pagination.total_pages, 2);

    let clamped = service
        .ranking(RankingOrder::CurrentStreak, 0, 500)
        .expect("ranking loads");
    assert_eq!(clamped.pagination.page, 1);
    assert_eq!(clamped.pagination.page_size, 100);
    assert_eq!(clamped.users[0].position, 1);

    let beyond = service
        .ranking(RankingOrder::CurrentStreak, 9, 2)
        .expect("ranking loads");
    assert!(beyond.users.is_empty());
}

#[test]
fn badge_view_marks_owned_badges_and_live_progress() {
    let (service, _store) = build_service();
    let user = register(&service, "Ana");
    // Monday through Wednesday.
    check_in_days(&service, &user.id, date(2025, 3, 3), 3);

    let badges = service
        .badges(&user.id, local(2025, 3, 5, 18, 0))
        .expect("badges load");
    assert_eq!(badges.len(), 16);

    let find = |id: &str| {
        badges
            .iter()
            .find(|entry| entry.badge.id == id)
            .expect("badge listed")
    };

    let starter = find("streak-1");
    assert!(starter.earned);
    assert!(starter.earned_at.is_some());
    assert_eq!(starter.progress, 100);

    assert!(find("special-1").earned);
    assert_eq!(find("streak-2").progress, 60);
    assert_eq!(find("total-1").progress, 60);
    assert_eq!(find("consistency-1").progress, 60);
    assert_eq!(find("consistency-2").progress, 15);

    let rainy = find("special-3");
    assert!(!rainy.earned);
    assert_eq!(rainy.progress, 0);

    let json = serde_json::to_value(starter).expect("serializes");
    assert_eq!(json["type"], "STREAK");
    assert_eq!(json["threshold"], 3);
    assert_eq!(json["earned"], true);
}
