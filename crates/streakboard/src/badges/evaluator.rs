use std::collections::HashSet;
use std::sync::Arc;

use super::catalog::{BadgeCatalog, BadgeDefinition};
use super::rules::{BadgeStats, DayContext, RuleOutcome};

/// Stateless evaluator that applies the catalog rules to a stats snapshot.
#[derive(Debug, Clone)]
pub struct BadgeEvaluator {
    catalog: Arc<BadgeCatalog>,
}

impl BadgeEvaluator {
    pub fn new(catalog: Arc<BadgeCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &BadgeCatalog {
        &self.catalog
    }

    /// Badges whose rule holds and which are not in `owned`, in catalog order.
    pub fn newly_earned(
        &self,
        stats: &BadgeStats,
        day: &DayContext,
        owned: &HashSet<String>,
    ) -> Vec<&BadgeDefinition> {
        self.catalog
            .badges()
            .iter()
            .filter(|badge| !owned.contains(badge.id))
            .filter(|badge| badge.rule.evaluate(stats, Some(day)).satisfied)
            .collect()
    }

    /// Outcome of every rule without a check-in in hand.
    pub fn progress(&self, stats: &BadgeStats) -> Vec<(&BadgeDefinition, RuleOutcome)> {
        self.catalog
            .badges()
            .iter()
            .map(|badge| (badge, badge.rule.evaluate(stats, None)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::calendar::DayKey;
    use chrono::NaiveTime;

    fn evaluator() -> BadgeEvaluator {
        BadgeEvaluator::new(Arc::new(BadgeCatalog::standard()))
    }

    fn friday_context() -> DayContext {
        DayContext {
            day: DayKey::from_ymd(2025, 3, 14).expect("valid date"),
            arrival: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
            location: "Joviano de Aguiar".to_string(),
            is_holiday: false,
            is_rainy: false,
        }
    }

    fn ids(badges: &[&BadgeDefinition]) -> Vec<&'static str> {
        badges.iter().map(|badge| badge.id).collect()
    }

    #[test]
    fn five_day_streak_unlocks_streak_and_total_badges() {
        let stats = BadgeStats {
            current_streak: 5,
            total_days: 5,
            weekly_days: 5,
            monthly_days: 5,
        };
        let evaluator = evaluator();
        let earned = evaluator.newly_earned(&stats, &friday_context(), &HashSet::new());
        assert_eq!(
            ids(&earned),
            vec!["streak-1", "streak-2", "total-1", "consistency-1"]
        );
    }

    #[test]
    fn owned_badges_are_never_returned_again() {
        let stats = BadgeStats {
            current_streak: 5,
            total_days: 5,
            weekly_days: 5,
            monthly_days: 5,
        };
        let owned: HashSet<String> = ["streak-1", "streak-2", "total-1"]
            .into_iter()
            .map(String::from)
            .collect();
        let evaluator = evaluator();
        let earned = evaluator.newly_earned(&stats, &friday_context(), &owned);
        assert_eq!(ids(&earned), vec!["consistency-1"]);
    }

    #[test]
    fn special_badges_follow_the_day_context() {
        let mut day = friday_context();
        day.arrival = NaiveTime::from_hms_opt(8, 0, 0).expect("valid time");
        day.location = "Quincas".to_string();
        let evaluator = evaluator();
        let earned = evaluator.newly_earned(&BadgeStats::default(), &day, &HashSet::new());
        assert_eq!(ids(&earned), vec!["special-5", "special-6"]);
    }

    #[test]
    fn progress_without_context_zeroes_special_badges() {
        let stats = BadgeStats {
            current_streak: 4,
            total_days: 12,
            weekly_days: 2,
            monthly_days: 12,
        };
        let evaluator = evaluator();
        let progress = evaluator.progress(&stats);
        let lookup = |id: &str| {
            progress
                .iter()
                .find(|(badge, _)| badge.id == id)
                .map(|(_, outcome)| outcome.progress)
                .expect("badge present")
        };
        assert_eq!(lookup("streak-2"), 80);
        assert_eq!(lookup("streak-1"), 100);
        assert_eq!(lookup("total-2"), 80);
        assert_eq!(lookup("consistency-1"), 40);
        assert_eq!(lookup("consistency-2"), 60);
        assert_eq!(lookup("special-1"), 0);
    }
}
