//! Achievement conditions.
//!
//! A condition is a closed tagged union. On the wire (TOML or JSON) it keeps
//! the flat `{ type, value }` shape, with `difficulty` and `max_hours` for
//! the time-bound completion variant. Unknown types load as
//! [`Condition::Unsupported`] and are never satisfied.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Difficulty;
use crate::tracking::{AchievementTracking, CounterField, FlagField, ProgressEvent};

/// A goal completion being evaluated, for time-bound conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionContext {
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl CompletionContext {
    /// The completion carried by a `GoalCompleted` event.
    pub fn from_event(event: &ProgressEvent) -> Option<Self> {
        match *event {
            ProgressEvent::GoalCompleted {
                difficulty,
                created_at,
                completed_at,
                ..
            } => Some(Self {
                difficulty,
                created_at,
                completed_at,
            }),
            _ => None,
        }
    }

    /// Wall-clock time from creation to completion; negative under clock skew.
    pub fn elapsed(&self) -> Duration {
        self.completed_at - self.created_at
    }
}

/// What a condition is checked against.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub tracking: &'a AchievementTracking,
    pub completion: Option<&'a CompletionContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    ConsecutiveLoginDays(u32),
    LoginsAtSameHour(u32),
    MidnightLogins(u32),
    TotalGoalsCreated(u32),
    GoalsCreated { difficulty: Difficulty, value: u32 },
    GoalsCompletedTotal(u32),
    GoalsCompleted { difficulty: Difficulty, value: u32 },
    StepsCompletedTotal(u32),
    HasPact,
    HasEditedPact,
    /// Rank tier (1-based) reached at least `value`
    RankUp(u32),
    /// Every per-difficulty creation counter is non-zero
    AllDifficultiesCreated,
    /// A goal of `difficulty` completed in under `max_hours` since creation.
    /// Only satisfiable while evaluating that completion.
    CompletedWithinDuration { difficulty: Difficulty, max_hours: u32 },
    Unsupported { kind: String },
}

impl Condition {
    pub fn is_satisfied(&self, ctx: &EvaluationContext<'_>) -> bool {
        let t = ctx.tracking;
        let at_least = |field: CounterField, value: u32| t.counter(field) >= value;

        match self {
            Condition::ConsecutiveLoginDays(v) => at_least(CounterField::ConsecutiveLoginDays, *v),
            Condition::LoginsAtSameHour(v) => at_least(CounterField::LoginsAtSameHourStreak, *v),
            Condition::MidnightLogins(v) => at_least(CounterField::MidnightLoginsCount, *v),
            Condition::TotalGoalsCreated(v) => at_least(CounterField::TotalGoalsCreated, *v),
            Condition::GoalsCreated { difficulty, value } => {
                at_least(CounterField::GoalsCreated(*difficulty), *value)
            }
            Condition::GoalsCompletedTotal(v) => at_least(CounterField::GoalsCompletedTotal, *v),
            Condition::GoalsCompleted { difficulty, value } => {
                at_least(CounterField::GoalsCompleted(*difficulty), *value)
            }
            Condition::StepsCompletedTotal(v) => at_least(CounterField::StepsCompletedTotal, *v),
            Condition::HasPact => t.flag(FlagField::HasPact),
            Condition::HasEditedPact => t.flag(FlagField::HasEditedPact),
            Condition::RankUp(v) => at_least(CounterField::CurrentRankTier, *v),
            Condition::AllDifficultiesCreated => t.goals_created.all_nonzero(),
            Condition::CompletedWithinDuration {
                difficulty,
                max_hours,
            } => ctx.completion.is_some_and(|c| {
                let elapsed = c.elapsed();
                c.difficulty == *difficulty
                    && elapsed > Duration::zero()
                    && elapsed < Duration::hours(i64::from(*max_hours))
            }),
            Condition::Unsupported { .. } => false,
        }
    }

    /// Whether the condition can only fire during a completion event.
    pub fn is_time_bound(&self) -> bool {
        matches!(self, Condition::CompletedWithinDuration { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum ConditionValue {
    Count(u32),
    Flag(bool),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCondition {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<ConditionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_hours: Option<u32>,
}

impl RawCondition {
    fn new(kind: impl Into<String>, value: Option<u32>) -> Self {
        Self {
            kind: kind.into(),
            value: value.map(ConditionValue::Count),
            difficulty: None,
            max_hours: None,
        }
    }

    fn count(&self) -> Option<u32> {
        match self.value {
            Some(ConditionValue::Count(n)) => Some(n),
            _ => None,
        }
    }
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        let unsupported = || Condition::Unsupported {
            kind: raw.kind.clone(),
        };
        let threshold = |make: fn(u32) -> Condition| raw.count().map_or_else(unsupported, make);

        match raw.kind.as_str() {
            "consecutive_login_days" => threshold(Condition::ConsecutiveLoginDays),
            "logins_at_same_hour" => threshold(Condition::LoginsAtSameHour),
            "midnight_logins" => threshold(Condition::MidnightLogins),
            "total_goals_created" => threshold(Condition::TotalGoalsCreated),
            "goals_completed_total" => threshold(Condition::GoalsCompletedTotal),
            "steps_completed_total" => threshold(Condition::StepsCompletedTotal),
            "rank_up" => threshold(Condition::RankUp),
            "has_pact" => Condition::HasPact,
            "has_edited_pact" => Condition::HasEditedPact,
            "all_difficulties_created" => Condition::AllDifficultiesCreated,
            "completed_within_duration" => match (raw.difficulty, raw.max_hours) {
                (Some(difficulty), Some(max_hours)) => Condition::CompletedWithinDuration {
                    difficulty,
                    max_hours,
                },
                _ => unsupported(),
            },
            other => {
                let per_difficulty = other
                    .strip_suffix("_goals_created")
                    .map(|d| (d, true))
                    .or_else(|| other.strip_suffix("_goals_completed").map(|d| (d, false)));
                match (per_difficulty, raw.count()) {
                    (Some((d, created)), Some(value)) => match d.parse::<Difficulty>() {
                        Ok(difficulty) if created => Condition::GoalsCreated { difficulty, value },
                        Ok(difficulty) => Condition::GoalsCompleted { difficulty, value },
                        Err(_) => unsupported(),
                    },
                    _ => unsupported(),
                }
            }
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::ConsecutiveLoginDays(v) => RawCondition::new("consecutive_login_days", Some(v)),
            Condition::LoginsAtSameHour(v) => RawCondition::new("logins_at_same_hour", Some(v)),
            Condition::MidnightLogins(v) => RawCondition::new("midnight_logins", Some(v)),
            Condition::TotalGoalsCreated(v) => RawCondition::new("total_goals_created", Some(v)),
            Condition::GoalsCreated { difficulty, value } => {
                RawCondition::new(format!("{difficulty}_goals_created"), Some(value))
            }
            Condition::GoalsCompletedTotal(v) => RawCondition::new("goals_completed_total", Some(v)),
            Condition::GoalsCompleted { difficulty, value } => {
                RawCondition::new(format!("{difficulty}_goals_completed"), Some(value))
            }
            Condition::StepsCompletedTotal(v) => RawCondition::new("steps_completed_total", Some(v)),
            Condition::HasPact => RawCondition::new("has_pact", None),
            Condition::HasEditedPact => RawCondition::new("has_edited_pact", None),
            Condition::RankUp(v) => RawCondition::new("rank_up", Some(v)),
            Condition::AllDifficultiesCreated => RawCondition::new("all_difficulties_created", None),
            Condition::CompletedWithinDuration {
                difficulty,
                max_hours,
            } => RawCondition {
                difficulty: Some(difficulty),
                max_hours: Some(max_hours),
                ..RawCondition::new("completed_within_duration", None)
            },
            Condition::Unsupported { kind } => RawCondition::new(kind, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(tracking: &AchievementTracking) -> EvaluationContext<'_> {
        EvaluationContext {
            tracking,
            completion: None,
        }
    }

    #[test]
    fn parses_flat_wire_form() {
        let c: Condition =
            serde_json::from_str(r#"{"type":"hard_goals_completed","value":2}"#).unwrap();
        assert_eq!(
            c,
            Condition::GoalsCompleted {
                difficulty: Difficulty::Hard,
                value: 2
            }
        );

        let c: Condition = serde_json::from_str(r#"{"type":"has_pact","value":true}"#).unwrap();
        assert_eq!(c, Condition::HasPact);

        let c: Condition = serde_json::from_str(
            r#"{"type":"completed_within_duration","difficulty":"extreme","max_hours":48}"#,
        )
        .unwrap();
        assert_eq!(
            c,
            Condition::CompletedWithinDuration {
                difficulty: Difficulty::Extreme,
                max_hours: 48
            }
        );
    }

    #[test]
    fn unknown_or_malformed_types_are_unsupported() {
        let c: Condition =
            serde_json::from_str(r#"{"type":"books_read","value":3}"#).unwrap();
        assert_eq!(
            c,
            Condition::Unsupported {
                kind: "books_read".into()
            }
        );

        let c: Condition =
            serde_json::from_str(r#"{"type":"legendary_goals_created","value":1}"#).unwrap();
        assert!(matches!(c, Condition::Unsupported { .. }));

        let c: Condition = serde_json::from_str(r#"{"type":"total_goals_created"}"#).unwrap();
        assert!(matches!(c, Condition::Unsupported { .. }));

        let tracking = AchievementTracking::empty("u1");
        assert!(!c.is_satisfied(&ctx(&tracking)));
    }

    #[test]
    fn serializes_back_to_wire_form() {
        let json = serde_json::to_value(Condition::GoalsCreated {
            difficulty: Difficulty::Custom,
            value: 1,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "custom_goals_created", "value": 1})
        );
    }

    #[test]
    fn thresholds_are_inclusive() {
        let mut tracking = AchievementTracking::empty("u1");
        tracking.consecutive_login_days = 7;
        assert!(Condition::ConsecutiveLoginDays(7).is_satisfied(&ctx(&tracking)));
        assert!(!Condition::ConsecutiveLoginDays(8).is_satisfied(&ctx(&tracking)));
    }

    #[test]
    fn all_difficulties_needs_six_tiers() {
        let mut tracking = AchievementTracking::empty("u1");
        for d in &Difficulty::ALL[..5] {
            *tracking.goals_created.get_mut(*d) = 1;
        }
        assert!(!Condition::AllDifficultiesCreated.is_satisfied(&ctx(&tracking)));
        tracking.goals_created.custom = 1;
        assert!(Condition::AllDifficultiesCreated.is_satisfied(&ctx(&tracking)));
    }

    #[test]
    fn time_bound_condition_needs_matching_completion() {
        let tracking = AchievementTracking::empty("u1");
        let condition = Condition::CompletedWithinDuration {
            difficulty: Difficulty::Extreme,
            max_hours: 48,
        };
        assert!(!condition.is_satisfied(&ctx(&tracking)));

        let created = Utc::now() - Duration::hours(30);
        let fast = CompletionContext {
            difficulty: Difficulty::Extreme,
            created_at: created,
            completed_at: created + Duration::hours(30),
        };
        let eval = EvaluationContext {
            tracking: &tracking,
            completion: Some(&fast),
        };
        assert!(condition.is_satisfied(&eval));

        let wrong_tier = CompletionContext {
            difficulty: Difficulty::Hard,
            ..fast
        };
        let eval = EvaluationContext {
            tracking: &tracking,
            completion: Some(&wrong_tier),
        };
        assert!(!condition.is_satisfied(&eval));
    }

    #[test]
    fn skewed_or_zero_duration_fails_quietly() {
        let tracking = AchievementTracking::empty("u1");
        let condition = Condition::CompletedWithinDuration {
            difficulty: Difficulty::Hard,
            max_hours: 24,
        };
        let now = Utc::now();
        for completed_at in [now, now - Duration::hours(2)] {
            let completion = CompletionContext {
                difficulty: Difficulty::Hard,
                created_at: now,
                completed_at,
            };
            let eval = EvaluationContext {
                tracking: &tracking,
                completion: Some(&completion),
            };
            assert!(!condition.is_satisfied(&eval));
        }
    }
}
