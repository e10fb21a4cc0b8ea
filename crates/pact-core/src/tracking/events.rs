//! Progress events and the counter operations they expand to.
//!
//! Every side-effecting trigger funnels through [`ProgressEvent`]; the only
//! place that decides which counters an action touches is [`plan_event`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::counters::{AchievementTracking, CounterField, FlagField};
use crate::model::Difficulty;
use crate::storage::TrackingConfig;

/// A user action that affects behavioral counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// App opened; `at` is the host's local wall-clock time.
    Login { at: NaiveDateTime },
    GoalCreated { difficulty: Difficulty },
    GoalCompleted {
        goal_id: String,
        difficulty: Difficulty,
        created_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    StepsCompleted { count: u32 },
    PactCreated,
    PactEdited,
    /// Current rank position, 1-based.
    RankReached { tier: u32 },
}

impl ProgressEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Login { .. } => "login",
            ProgressEvent::GoalCreated { .. } => "goal_created",
            ProgressEvent::GoalCompleted { .. } => "goal_completed",
            ProgressEvent::StepsCompleted { .. } => "steps_completed",
            ProgressEvent::PactCreated => "pact_created",
            ProgressEvent::PactEdited => "pact_edited",
            ProgressEvent::RankReached { .. } => "rank_reached",
        }
    }
}

/// A single store mutation on the tracking row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOp {
    /// Atomic add
    Increment { field: CounterField, delta: u32 },
    /// Direct set (streak resets)
    Set { field: CounterField, value: u32 },
    /// Atomic `max(current, value)`
    RaiseTo { field: CounterField, value: u32 },
    SetFlag { flag: FlagField, value: bool },
    /// Move the day and same-hour streaks to `date`, at most once per day.
    /// The store decides continuation against its own row, not the caller's copy.
    AdvanceLoginDay { date: NaiveDate, hour: u32 },
}

/// Expand an event into counter operations, given the current tracking row.
///
/// Only login needs the current row (day and hour streaks); every other
/// event is a pure increment or flag set.
pub fn plan_event(
    tracking: &AchievementTracking,
    event: &ProgressEvent,
    policy: &TrackingConfig,
) -> Vec<CounterOp> {
    match event {
        ProgressEvent::Login { at } => plan_login(tracking, *at, policy),
        ProgressEvent::GoalCreated { difficulty } => vec![
            CounterOp::Increment {
                field: CounterField::TotalGoalsCreated,
                delta: 1,
            },
            CounterOp::Increment {
                field: CounterField::GoalsCreated(*difficulty),
                delta: 1,
            },
        ],
        ProgressEvent::GoalCompleted { difficulty, .. } => vec![
            CounterOp::Increment {
                field: CounterField::GoalsCompletedTotal,
                delta: 1,
            },
            CounterOp::Increment {
                field: CounterField::GoalsCompleted(*difficulty),
                delta: 1,
            },
        ],
        ProgressEvent::StepsCompleted { count } if *count > 0 => vec![CounterOp::Increment {
            field: CounterField::StepsCompletedTotal,
            delta: *count,
        }],
        ProgressEvent::StepsCompleted { .. } => Vec::new(),
        ProgressEvent::PactCreated => vec![CounterOp::SetFlag {
            flag: FlagField::HasPact,
            value: true,
        }],
        ProgressEvent::PactEdited => vec![CounterOp::SetFlag {
            flag: FlagField::HasEditedPact,
            value: true,
        }],
        ProgressEvent::RankReached { tier } => vec![CounterOp::RaiseTo {
            field: CounterField::CurrentRankTier,
            value: *tier,
        }],
    }
}

fn plan_login(
    tracking: &AchievementTracking,
    at: NaiveDateTime,
    policy: &TrackingConfig,
) -> Vec<CounterOp> {
    let today = at.date();
    let hour = at.hour();
    let mut ops = Vec::new();

    // Streaks move at most once per calendar day.
    if tracking.last_login_date != Some(today) {
        ops.push(CounterOp::AdvanceLoginDay { date: today, hour });
    }

    if hour < policy.midnight_window_end_hour {
        ops.push(CounterOp::Increment {
            field: CounterField::MidnightLoginsCount,
            delta: 1,
        });
    }

    ops
}
