//! Counter fields and the per-user tracking row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::Difficulty;

/// Numeric column of the tracking row.
///
/// The closed set of fields replaces free-form field-name strings, so every
/// column name used in SQL comes from [`CounterField::column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterField {
    ConsecutiveLoginDays,
    LoginsAtSameHourStreak,
    MidnightLoginsCount,
    TotalGoalsCreated,
    GoalsCreated(Difficulty),
    GoalsCompletedTotal,
    GoalsCompleted(Difficulty),
    StepsCompletedTotal,
    CurrentRankTier,
}

impl CounterField {
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::ConsecutiveLoginDays => "consecutive_login_days",
            CounterField::LoginsAtSameHourStreak => "logins_at_same_hour_streak",
            CounterField::MidnightLoginsCount => "midnight_logins_count",
            CounterField::TotalGoalsCreated => "total_goals_created",
            CounterField::GoalsCreated(d) => match d {
                Difficulty::Easy => "easy_goals_created",
                Difficulty::Medium => "medium_goals_created",
                Difficulty::Hard => "hard_goals_created",
                Difficulty::Extreme => "extreme_goals_created",
                Difficulty::Impossible => "impossible_goals_created",
                Difficulty::Custom => "custom_goals_created",
            },
            CounterField::GoalsCompletedTotal => "goals_completed_total",
            CounterField::GoalsCompleted(d) => match d {
                Difficulty::Easy => "easy_goals_completed",
                Difficulty::Medium => "medium_goals_completed",
                Difficulty::Hard => "hard_goals_completed",
                Difficulty::Extreme => "extreme_goals_completed",
                Difficulty::Impossible => "impossible_goals_completed",
                Difficulty::Custom => "custom_goals_completed",
            },
            CounterField::StepsCompletedTotal => "steps_completed_total",
            CounterField::CurrentRankTier => "current_rank_tier",
        }
    }

    /// Every counter column, in table order.
    pub fn all() -> Vec<CounterField> {
        let mut fields = vec![
            CounterField::ConsecutiveLoginDays,
            CounterField::LoginsAtSameHourStreak,
            CounterField::MidnightLoginsCount,
            CounterField::TotalGoalsCreated,
        ];
        fields.extend(Difficulty::ALL.into_iter().map(CounterField::GoalsCreated));
        fields.push(CounterField::GoalsCompletedTotal);
        fields.extend(Difficulty::ALL.into_iter().map(CounterField::GoalsCompleted));
        fields.push(CounterField::StepsCompletedTotal);
        fields.push(CounterField::CurrentRankTier);
        fields
    }
}

/// Boolean column of the tracking row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagField {
    HasPact,
    HasEditedPact,
}

impl FlagField {
    pub fn column(&self) -> &'static str {
        match self {
            FlagField::HasPact => "has_pact",
            FlagField::HasEditedPact => "has_edited_pact",
        }
    }
}

/// Six per-difficulty counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DifficultyCounts {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub extreme: u32,
    pub impossible: u32,
    pub custom: u32,
}

impl DifficultyCounts {
    pub fn get(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Extreme => self.extreme,
            Difficulty::Impossible => self.impossible,
            Difficulty::Custom => self.custom,
        }
    }

    pub fn get_mut(&mut self, difficulty: Difficulty) -> &mut u32 {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
            Difficulty::Extreme => &mut self.extreme,
            Difficulty::Impossible => &mut self.impossible,
            Difficulty::Custom => &mut self.custom,
        }
    }

    /// True when every tier has a non-zero count.
    pub fn all_nonzero(&self) -> bool {
        Difficulty::ALL.into_iter().all(|d| self.get(d) > 0)
    }
}

/// Raw behavioral counters for one user, consumed by achievement conditions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AchievementTracking {
    pub user_id: String,
    pub consecutive_login_days: u32,
    pub last_login_date: Option<NaiveDate>,
    pub logins_at_same_hour_streak: u32,
    pub usual_login_hour: Option<u32>,
    pub midnight_logins_count: u32,
    pub total_goals_created: u32,
    pub goals_created: DifficultyCounts,
    pub goals_completed_total: u32,
    pub goals_completed: DifficultyCounts,
    pub steps_completed_total: u32,
    pub has_pact: bool,
    pub has_edited_pact: bool,
    pub current_rank_tier: u32,
}

impl AchievementTracking {
    /// All-zero row for a user that has no tracking yet.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn counter(&self, field: CounterField) -> u32 {
        match field {
            CounterField::ConsecutiveLoginDays => self.consecutive_login_days,
            CounterField::LoginsAtSameHourStreak => self.logins_at_same_hour_streak,
            CounterField::MidnightLoginsCount => self.midnight_logins_count,
            CounterField::TotalGoalsCreated => self.total_goals_created,
            CounterField::GoalsCreated(d) => self.goals_created.get(d),
            CounterField::GoalsCompletedTotal => self.goals_completed_total,
            CounterField::GoalsCompleted(d) => self.goals_completed.get(d),
            CounterField::StepsCompletedTotal => self.steps_completed_total,
            CounterField::CurrentRankTier => self.current_rank_tier,
        }
    }

    pub fn counter_mut(&mut self, field: CounterField) -> &mut u32 {
        match field {
            CounterField::ConsecutiveLoginDays => &mut self.consecutive_login_days,
            CounterField::LoginsAtSameHourStreak => &mut self.logins_at_same_hour_streak,
            CounterField::MidnightLoginsCount => &mut self.midnight_logins_count,
            CounterField::TotalGoalsCreated => &mut self.total_goals_created,
            CounterField::GoalsCreated(d) => self.goals_created.get_mut(d),
            CounterField::GoalsCompletedTotal => &mut self.goals_completed_total,
            CounterField::GoalsCompleted(d) => self.goals_completed.get_mut(d),
            CounterField::StepsCompletedTotal => &mut self.steps_completed_total,
            CounterField::CurrentRankTier => &mut self.current_rank_tier,
        }
    }

    pub fn flag(&self, flag: FlagField) -> bool {
        match flag {
            FlagField::HasPact => self.has_pact,
            FlagField::HasEditedPact => self.has_edited_pact,
        }
    }

    /// Advance the day and same-hour streaks for a login on `date`.
    ///
    /// Returns `false` and leaves the row untouched when `date` was already
    /// counted. `Database` runs the same rule as one guarded `UPDATE`.
    pub fn advance_login_day(&mut self, date: NaiveDate, hour: u32) -> bool {
        if self.last_login_date == Some(date) {
            return false;
        }
        let continues = self.last_login_date.and_then(|last| last.succ_opt()) == Some(date);
        self.consecutive_login_days = if continues {
            self.consecutive_login_days + 1
        } else {
            1
        };
        self.logins_at_same_hour_streak =
            if self.usual_login_hour == Some(hour) && self.logins_at_same_hour_streak > 0 {
                self.logins_at_same_hour_streak + 1
            } else {
                1
            };
        self.usual_login_hour = Some(hour);
        self.last_login_date = Some(date);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn counter_columns_are_unique() {
        let fields = CounterField::all();
        assert_eq!(fields.len(), 18);
        let columns: HashSet<_> = fields.iter().map(|f| f.column()).collect();
        assert_eq!(columns.len(), fields.len());
    }

    #[test]
    fn counter_accessors_agree() {
        let mut tracking = AchievementTracking::empty("u1");
        for (i, field) in CounterField::all().into_iter().enumerate() {
            *tracking.counter_mut(field) = i as u32 + 1;
        }
        for (i, field) in CounterField::all().into_iter().enumerate() {
            assert_eq!(tracking.counter(field), i as u32 + 1);
        }
    }

    #[test]
    fn login_day_advances_once_per_date() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let mut tracking = AchievementTracking::empty("u1");
        assert!(tracking.advance_login_day(day(1), 9));
        assert!(tracking.advance_login_day(day(2), 9));
        assert!(!tracking.advance_login_day(day(2), 9));
        assert_eq!(tracking.consecutive_login_days, 2);
        assert_eq!(tracking.logins_at_same_hour_streak, 2);

        assert!(tracking.advance_login_day(day(5), 7));
        assert_eq!(tracking.consecutive_login_days, 1);
        assert_eq!(tracking.logins_at_same_hour_streak, 1);
        assert_eq!(tracking.usual_login_hour, Some(7));
    }

    #[test]
    fn all_nonzero_requires_every_tier() {
        let mut counts = DifficultyCounts::default();
        for d in &Difficulty::ALL[..5] {
            *counts.get_mut(*d) = 1;
        }
        assert!(!counts.all_nonzero());
        counts.custom = 2;
        assert!(counts.all_nonzero());
    }
}
