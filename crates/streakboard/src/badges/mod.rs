//! Declarative badge catalog, rule evaluation, and award bookkeeping.

pub mod awards;
pub mod catalog;
pub mod evaluator;
pub mod rules;
pub mod signals;

pub use awards::{BadgeAward, BadgeAwardLedger, BadgeStore};
pub use catalog::{BadgeCatalog, BadgeDefinition, BadgeSummary};
pub use evaluator::BadgeEvaluator;
pub use rules::{BadgeKind, BadgeRule, BadgeStats, DayCondition, DayContext, RuleOutcome};
pub use signals::{DaySignals, HolidayCalendar, NoDaySignals};
