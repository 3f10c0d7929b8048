use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::catalog::{BadgeCatalog, BadgeDefinition, BadgeSummary};
use crate::attendance::domain::UserId;
use crate::attendance::repository::StoreError;

/// A badge granted to a user. Unique per `(user_id, badge_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub user_id: UserId,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

/// Storage for catalog metadata and granted awards.
pub trait BadgeStore: Send + Sync {
    /// Upserts catalog metadata. Called once at startup, never per award.
    fn seed_badges(&self, badges: &[BadgeSummary]) -> Result<(), StoreError>;
    fn awards_for(&self, user: &UserId) -> Result<Vec<BadgeAward>, StoreError>;
    /// Fails with [`StoreError::Conflict`] when already granted and
    /// [`StoreError::NotFound`] when the badge id was never seeded.
    fn insert_award(&self, award: BadgeAward) -> Result<(), StoreError>;
}

/// Deduplicates candidate badges against ownership and persists the remainder.
pub struct BadgeAwardLedger<B> {
    store: Arc<B>,
}

impl<B> BadgeAwardLedger<B>
where
    B: BadgeStore + 'static,
{
    pub fn new(store: Arc<B>) -> Self {
        Self { store }
    }

    pub fn seed_catalog(&self, catalog: &BadgeCatalog) -> Result<(), StoreError> {
        let summaries = catalog.summaries();
        self.store.seed_badges(&summaries)?;
        info!(badges = summaries.len(), "badge catalog seeded");
        Ok(())
    }

    /// Owned badge ids mapped to when they were earned.
    pub fn owned(&self, user: &UserId) -> Result<HashMap<String, DateTime<Utc>>, StoreError> {
        Ok(self
            .store
            .awards_for(user)?
            .into_iter()
            .map(|award| (award.badge_id, award.earned_at))
            .collect())
    }

    /// Grants every candidate the user does not already hold and returns only those
    /// inserted by this call. Safe to repeat with the same candidates.
    pub fn award_new_badges(
        &self,
        user: &UserId,
        candidates: &[&BadgeDefinition],
        earned_at: DateTime<Utc>,
    ) -> Result<Vec<BadgeDefinition>, StoreError> {
        let owned = self.owned(user)?;
        let mut awarded = Vec::new();

        for badge in candidates {
            if owned.contains_key(badge.id) {
                continue;
            }

            let award = BadgeAward {
                user_id: user.clone(),
                badge_id: badge.id.to_string(),
                earned_at,
            };

            match self.store.insert_award(award) {
                Ok(()) => {
                    info!(user_id = %user, badge = badge.id, "badge awarded");
                    awarded.push((*badge).clone());
                }
                Err(StoreError::Conflict) => {
                    debug!(user_id = %user, badge = badge.id, "badge already owned");
                }
                Err(err) => {
                    warn!(user_id = %user, badge = badge.id, error = %err, "badge award failed");
                }
            }
        }

        Ok(awarded)
    }
}
