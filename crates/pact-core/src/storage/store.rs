//! The record-store contract the engine runs against.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::achievements::UserAchievement;
use crate::error::Result;
use crate::model::{Goal, Pact, Rank, Step};
use crate::streak::HealthStreak;
use crate::tracking::{AchievementTracking, CounterField, CounterOp, FlagField};

/// Outcome of the opaque promo/reward path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoRedemption {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<i64>,
}

impl PromoRedemption {
    pub fn rejected(reason: &str) -> Self {
        Self {
            success: false,
            error: Some(reason.to_string()),
            reward_type: None,
            reward_amount: None,
        }
    }
}

/// Persistent state consumed and mutated by the engine.
///
/// Counter mutations must be atomic on the store side: two clients
/// incrementing the same field concurrently must both land. Unlock inserts
/// must surface a duplicate as `DatabaseError::UniqueViolation`.
pub trait ProgressStore {
    fn get_pact(&self, user_id: &str) -> Result<Option<Pact>>;

    /// Goals of a user, oldest first.
    fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>>;

    /// Steps of a goal, by `order`.
    fn list_steps(&self, goal_id: &str) -> Result<Vec<Step>>;

    /// Ranks of a user, ascending by `min_points`.
    fn list_ranks(&self, user_id: &str) -> Result<Vec<Rank>>;

    /// Tracking row; all-zero when the user has none yet.
    fn read_tracking(&self, user_id: &str) -> Result<AchievementTracking>;

    /// Atomically add `delta`, creating the row if absent.
    fn increment_counter(&self, user_id: &str, field: CounterField, delta: u32) -> Result<()>;

    fn set_counter(&self, user_id: &str, field: CounterField, value: u32) -> Result<()>;

    /// Atomically set the field to `max(current, value)`.
    fn raise_counter(&self, user_id: &str, field: CounterField, value: u32) -> Result<()>;

    fn set_flag(&self, user_id: &str, flag: FlagField, value: bool) -> Result<()>;

    /// Atomically advance the login day and same-hour streaks to `date`.
    ///
    /// Continuation is decided against the stored row inside the same
    /// statement, so two clients logging in on the same new day move the
    /// streak once. Returns whether this call advanced it.
    fn advance_login_day(&self, user_id: &str, date: NaiveDate, hour: u32) -> Result<bool>;

    /// Apply one planned counter operation.
    fn apply_counter_op(&self, user_id: &str, op: &CounterOp) -> Result<()> {
        match *op {
            CounterOp::Increment { field, delta } => self.increment_counter(user_id, field, delta),
            CounterOp::Set { field, value } => self.set_counter(user_id, field, value),
            CounterOp::RaiseTo { field, value } => self.raise_counter(user_id, field, value),
            CounterOp::SetFlag { flag, value } => self.set_flag(user_id, flag, value),
            CounterOp::AdvanceLoginDay { date, hour } => {
                self.advance_login_day(user_id, date, hour).map(|_| ())
            }
        }
    }

    fn unlocked_achievements(&self, user_id: &str) -> Result<Vec<UserAchievement>>;

    fn unlocked_keys(&self, user_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .unlocked_achievements(user_id)?
            .into_iter()
            .map(|a| a.achievement_key)
            .collect())
    }

    /// Insert an unlock row. A second insert for the same pair fails with
    /// `DatabaseError::UniqueViolation`.
    fn insert_unlock(&self, user_id: &str, key: &str, unlocked_at: DateTime<Utc>) -> Result<()>;

    fn load_health_streak(&self, user_id: &str) -> Result<Option<HealthStreak>>;

    fn save_health_streak(&self, streak: &HealthStreak) -> Result<()>;

    fn redeem_promo_code(&self, user_id: &str, code: &str) -> Result<PromoRedemption>;
}
