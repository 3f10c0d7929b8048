//! Daily attendance ledger with consecutive-day streaks and gamification badges.
//!
//! The [`attendance`] module owns check-ins, streak bookkeeping and the HTTP surface;
//! [`badges`] holds the declarative catalog, the rule evaluator and the award ledger.

pub mod attendance;
pub mod badges;
pub mod config;
pub mod error;
pub mod telemetry;
