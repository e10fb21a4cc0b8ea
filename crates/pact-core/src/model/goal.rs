//! Goals and steps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Goal difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Extreme,
    Impossible,
    Custom,
}

impl Difficulty {
    /// Every tier, in ascending order.
    pub const ALL: [Difficulty; 6] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Extreme,
        Difficulty::Impossible,
        Difficulty::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Extreme => "extreme",
            Difficulty::Impossible => "impossible",
            Difficulty::Custom => "custom",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownVariant {
                kind: "difficulty",
                value: s.to_string(),
            })
    }
}

/// How progress on a goal is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    /// Discrete steps
    #[default]
    Standard,
    /// Daily boolean check array
    Habit,
    /// Umbrella goal
    Super,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Standard => "standard",
            GoalType::Habit => "habit",
            GoalType::Super => "super",
        }
    }
}

impl FromStr for GoalType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(GoalType::Standard),
            "habit" => Ok(GoalType::Habit),
            "super" => Ok(GoalType::Super),
            other => Err(ValidationError::UnknownVariant {
                kind: "goal type",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    InProgress,
    FullyCompleted,
    Validated,
    Paused,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::NotStarted => "not_started",
            GoalStatus::InProgress => "in_progress",
            GoalStatus::FullyCompleted => "fully_completed",
            GoalStatus::Validated => "validated",
            GoalStatus::Paused => "paused",
        }
    }

    /// `fully_completed` and `validated` both count as done.
    pub fn is_completed(&self) -> bool {
        matches!(self, GoalStatus::FullyCompleted | GoalStatus::Validated)
    }
}

impl FromStr for GoalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(GoalStatus::NotStarted),
            "in_progress" => Ok(GoalStatus::InProgress),
            "fully_completed" => Ok(GoalStatus::FullyCompleted),
            "validated" => Ok(GoalStatus::Validated),
            "paused" => Ok(GoalStatus::Paused),
            other => Err(ValidationError::UnknownVariant {
                kind: "goal status",
                value: other.to_string(),
            }),
        }
    }
}

/// A user goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Free-form type/category label
    #[serde(default)]
    pub category: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub goal_type: GoalType,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub validated_steps: u32,
    /// Maximum XP awardable for this goal
    #[serde(default)]
    pub potential_score: u32,
    #[serde(default)]
    pub is_focus: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub habit_duration_days: Option<u32>,
    /// One entry per elapsed day, habit goals only
    #[serde(default)]
    pub habit_checks: Vec<bool>,
}

impl Goal {
    /// Create a goal with zeroed progress.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        difficulty: Difficulty,
        potential_score: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            category: String::new(),
            difficulty,
            goal_type: GoalType::Standard,
            status: GoalStatus::NotStarted,
            total_steps: 0,
            validated_steps: 0,
            potential_score,
            is_focus: false,
            created_at: Utc::now(),
            completion_date: None,
            habit_duration_days: None,
            habit_checks: Vec::new(),
        }
    }

    pub fn is_habit(&self) -> bool {
        self.goal_type == GoalType::Habit
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Validated steps, never more than the total.
    pub fn clamped_validated_steps(&self) -> u32 {
        self.validated_steps.min(self.total_steps)
    }

    /// Number of `true` entries in the habit check array.
    pub fn habit_checked_count(&self) -> usize {
        self.habit_checks.iter().filter(|c| **c).count()
    }
}

/// Completion state of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Completed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Completed => "completed",
        }
    }
}

impl FromStr for StepStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StepStatus::Pending),
            "completed" => Ok(StepStatus::Completed),
            other => Err(ValidationError::UnknownVariant {
                kind: "step status",
                value: other.to_string(),
            }),
        }
    }
}

/// A discrete step of a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub goal_id: String,
    pub title: String,
    pub status: StepStatus,
    /// Sort key, unique per goal
    pub order: u32,
    pub completion_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_all_tiers() {
        for d in Difficulty::ALL {
            assert_eq!(d.as_str().parse::<Difficulty>().unwrap(), d);
        }
        assert!("legendary".parse::<Difficulty>().is_err());
    }

    #[test]
    fn status_serde_uses_snake_case() {
        let json = serde_json::to_string(&GoalStatus::FullyCompleted).unwrap();
        assert_eq!(json, "\"fully_completed\"");
        assert!(GoalStatus::Validated.is_completed());
        assert!(!GoalStatus::InProgress.is_completed());
    }

    #[test]
    fn clamped_validated_steps_handles_anomaly() {
        let mut goal = Goal::new("u1", "Run", Difficulty::Easy, 100);
        goal.total_steps = 4;
        goal.validated_steps = 9;
        assert_eq!(goal.clamped_validated_steps(), 4);
    }
}
