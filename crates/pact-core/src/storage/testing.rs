//! A `Database` wrapper that injects store faults for tests.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use super::{Database, ProgressStore, PromoRedemption};
use crate::achievements::UserAchievement;
use crate::error::{DatabaseError, Result};
use crate::model::{Goal, Pact, Rank, Step};
use crate::streak::HealthStreak;
use crate::tracking::{AchievementTracking, CounterField, FlagField};

pub(crate) struct FaultyStore {
    pub inner: Database,
    /// Counter increments fail with `DatabaseError::Locked`.
    pub locked_counters: bool,
    /// `unlocked_keys` reports nothing, as a read taken before another
    /// client's unlock would.
    pub stale_unlocks: bool,
}

impl FaultyStore {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            locked_counters: false,
            stale_unlocks: false,
        }
    }
}

impl ProgressStore for FaultyStore {
    fn get_pact(&self, user_id: &str) -> Result<Option<Pact>> {
        self.inner.get_pact(user_id)
    }

    fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        self.inner.list_goals(user_id)
    }

    fn list_steps(&self, goal_id: &str) -> Result<Vec<Step>> {
        self.inner.list_steps(goal_id)
    }

    fn list_ranks(&self, user_id: &str) -> Result<Vec<Rank>> {
        self.inner.list_ranks(user_id)
    }

    fn read_tracking(&self, user_id: &str) -> Result<AchievementTracking> {
        self.inner.read_tracking(user_id)
    }

    fn increment_counter(&self, user_id: &str, field: CounterField, delta: u32) -> Result<()> {
        if self.locked_counters {
            return Err(DatabaseError::Locked.into());
        }
        self.inner.increment_counter(user_id, field, delta)
    }

    fn set_counter(&self, user_id: &str, field: CounterField, value: u32) -> Result<()> {
        self.inner.set_counter(user_id, field, value)
    }

    fn raise_counter(&self, user_id: &str, field: CounterField, value: u32) -> Result<()> {
        self.inner.raise_counter(user_id, field, value)
    }

    fn set_flag(&self, user_id: &str, flag: FlagField, value: bool) -> Result<()> {
        self.inner.set_flag(user_id, flag, value)
    }

    fn advance_login_day(&self, user_id: &str, date: NaiveDate, hour: u32) -> Result<bool> {
        self.inner.advance_login_day(user_id, date, hour)
    }

    fn unlocked_achievements(&self, user_id: &str) -> Result<Vec<UserAchievement>> {
        self.inner.unlocked_achievements(user_id)
    }

    fn unlocked_keys(&self, user_id: &str) -> Result<HashSet<String>> {
        if self.stale_unlocks {
            return Ok(HashSet::new());
        }
        self.inner.unlocked_keys(user_id)
    }

    fn insert_unlock(&self, user_id: &str, key: &str, unlocked_at: DateTime<Utc>) -> Result<()> {
        self.inner.insert_unlock(user_id, key, unlocked_at)
    }

    fn load_health_streak(&self, user_id: &str) -> Result<Option<HealthStreak>> {
        self.inner.load_health_streak(user_id)
    }

    fn save_health_streak(&self, streak: &HealthStreak) -> Result<()> {
        self.inner.save_health_streak(streak)
    }

    fn redeem_promo_code(&self, user_id: &str, code: &str) -> Result<PromoRedemption> {
        self.inner.redeem_promo_code(user_id, code)
    }
}
