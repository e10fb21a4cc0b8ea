//! Achievement evaluation and idempotent unlocks.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{AchievementCatalog, AchievementCategory, AchievementDefinition, Rarity};
use super::condition::{CompletionContext, EvaluationContext};
use crate::error::Result;
use crate::storage::ProgressStore;
use crate::tracking::AchievementTracking;

/// Name shown for hidden achievements that are still locked.
pub const HIDDEN_NAME: &str = "???";

/// A persisted unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub user_id: String,
    pub achievement_key: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Toast contents for an achievement unlocked by this evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockNotice {
    pub key: String,
    pub name: String,
    pub rarity: Rarity,
    pub rarity_label: String,
}

impl UnlockNotice {
    fn from_definition(def: &AchievementDefinition) -> Self {
        Self {
            key: def.key.clone(),
            name: def.name.clone(),
            rarity: def.rarity,
            rarity_label: def.rarity.label(),
        }
    }
}

/// One catalog entry with the user's unlock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub key: String,
    pub name: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub is_hidden: bool,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct AchievementEngine {
    catalog: AchievementCatalog,
}

impl AchievementEngine {
    pub fn new(catalog: AchievementCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    /// Definitions whose condition holds and that are not yet unlocked.
    pub fn pending<'a>(
        &'a self,
        tracking: &AchievementTracking,
        unlocked: &HashSet<String>,
        completion: Option<&CompletionContext>,
    ) -> Vec<&'a AchievementDefinition> {
        let ctx = EvaluationContext {
            tracking,
            completion,
        };
        self.catalog
            .definitions()
            .iter()
            .filter(|def| !unlocked.contains(&def.key))
            .filter(|def| def.condition.is_satisfied(&ctx))
            .collect()
    }

    /// Evaluate the whole catalog and persist new unlocks.
    ///
    /// Returns only achievements unlocked by this call. A unique violation on
    /// insert means another client unlocked the same key first; it is skipped.
    pub fn evaluate<S: ProgressStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        completion: Option<&CompletionContext>,
        now: DateTime<Utc>,
    ) -> Result<Vec<UnlockNotice>> {
        let tracking = store.read_tracking(user_id)?;
        let unlocked = store.unlocked_keys(user_id)?;

        let mut notices = Vec::new();
        for def in self.pending(&tracking, &unlocked, completion) {
            match store.insert_unlock(user_id, &def.key, now) {
                Ok(()) => {
                    tracing::info!(
                        user_id,
                        key = %def.key,
                        rarity = %def.rarity,
                        "achievement unlocked"
                    );
                    notices.push(UnlockNotice::from_definition(def));
                }
                Err(e) if e.is_unique_violation() => {
                    tracing::debug!(user_id, key = %def.key, "achievement already unlocked elsewhere");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(notices)
    }

    /// Every definition with its unlock state; hidden locked names are masked.
    pub fn list<S: ProgressStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
    ) -> Result<Vec<AchievementStatus>> {
        let unlocked: HashMap<String, DateTime<Utc>> = store
            .unlocked_achievements(user_id)?
            .into_iter()
            .map(|a| (a.achievement_key, a.unlocked_at))
            .collect();

        Ok(self
            .catalog
            .definitions()
            .iter()
            .map(|def| {
                let unlocked_at = unlocked.get(&def.key).copied();
                let name = if def.is_hidden && unlocked_at.is_none() {
                    HIDDEN_NAME.to_string()
                } else {
                    def.name.clone()
                };
                AchievementStatus {
                    key: def.key.clone(),
                    name,
                    category: def.category,
                    rarity: def.rarity,
                    is_hidden: def.is_hidden,
                    unlocked: unlocked_at.is_some(),
                    unlocked_at,
                }
            })
            .collect())
    }
}
