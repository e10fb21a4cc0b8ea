//! Daily check-in streaks.
//!
//! A streak advances at most once per calendar day. Checking in the day
//! after the last check-in extends it; any larger gap starts over at one.
//! Milestones fire only on the check-in that makes the current streak equal
//! to the milestone, so each crossing is reported once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted streak state for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStreak {
    pub user_id: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_checkin_date: Option<NaiveDate>,
    pub total_checkins: u32,
}

impl HealthStreak {
    fn first(user_id: &str, today: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            current_streak: 1,
            longest_streak: 1,
            last_checkin_date: Some(today),
            total_checkins: 1,
        }
    }
}

/// Celebration raised when a streak reaches a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakMilestone {
    pub days: u32,
}

impl StreakMilestone {
    pub fn message(&self) -> String {
        format!("{}-day check-in streak!", self.days)
    }
}

/// Result of a check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInOutcome {
    pub streak: HealthStreak,
    /// False when the user had already checked in today.
    pub counted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<StreakMilestone>,
}

/// Advance a streak for a check-in on `today`.
///
/// Pure transition; persistence is the caller's job.
pub fn check_in(
    user_id: &str,
    previous: Option<HealthStreak>,
    today: NaiveDate,
    milestones: &[u32],
) -> CheckInOutcome {
    let streak = match previous {
        None => HealthStreak::first(user_id, today),
        Some(existing) if existing.last_checkin_date == Some(today) => {
            return CheckInOutcome {
                streak: existing,
                counted: false,
                milestone: None,
            };
        }
        Some(mut existing) => {
            let is_consecutive = existing
                .last_checkin_date
                .and_then(|last| last.succ_opt())
                .is_some_and(|next| next == today);

            existing.current_streak = if is_consecutive {
                existing.current_streak.saturating_add(1)
            } else {
                1
            };
            existing.longest_streak = existing.longest_streak.max(existing.current_streak);
            existing.total_checkins = existing.total_checkins.saturating_add(1);
            existing.last_checkin_date = Some(today);
            existing
        }
    };

    let milestone = milestones
        .iter()
        .copied()
        .find(|m| *m == streak.current_streak)
        .map(|days| StreakMilestone { days });

    CheckInOutcome {
        streak,
        counted: true,
        milestone,
    }
}
