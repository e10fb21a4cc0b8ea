//! The individual insight heuristics, in evaluation order.

use chrono::NaiveDate;

use super::{InsightLevel, PactInsight};
use crate::model::{Goal, GoalStatus, Pact};
use crate::storage::InsightsConfig;

fn goal_route(goal: &Goal) -> String {
    format!("/goals/{}", goal.id)
}

fn age_days(goal: &Goal, today: NaiveDate) -> i64 {
    (today - goal.created_at.date_naive()).num_days()
}

/// Share of the pact timeline already elapsed, against incomplete focus goals.
pub(super) fn deadline_proximity(
    pact: &Pact,
    goals: &[Goal],
    today: NaiveDate,
    config: &InsightsConfig,
) -> Option<PactInsight> {
    let (start, end) = pact.timeline()?;
    let days_total = (end - start).num_days().max(1);
    let days_elapsed = (today - start).num_days();
    let elapsed_pct = (days_elapsed as f64 / days_total as f64 * 100.0).clamp(0.0, 100.0);

    let open_focus = || goals.iter().filter(|g| g.is_focus && !g.is_completed());
    let days_left = (end - today).num_days().max(0);

    if elapsed_pct >= config.deadline_critical_pct {
        let remaining = open_focus().filter(|g| !g.is_habit()).count();
        if remaining > 0 {
            return Some(
                PactInsight::new(
                    "deadline-critical",
                    InsightLevel::Critical,
                    "Deadline imminent",
                    format!(
                        "{:.0}% of your pact timeline has passed with {days_left} days left, \
                         and {remaining} focus goal(s) are still open.",
                        elapsed_pct
                    ),
                )
                .with_action("Review focus goals", "/goals?filter=focus"),
            );
        }
    }

    if elapsed_pct >= config.deadline_warning_pct {
        let remaining = open_focus().count();
        if remaining > 0 {
            return Some(
                PactInsight::new(
                    "deadline-warning",
                    InsightLevel::Warning,
                    "Past the halfway mark",
                    format!(
                        "{:.0}% of your pact timeline has passed. {remaining} focus goal(s) remain.",
                        elapsed_pct
                    ),
                )
                .with_action("Review focus goals", "/goals?filter=focus"),
            );
        }
    }

    None
}

fn is_stagnant(goal: &Goal, today: NaiveDate, config: &InsightsConfig) -> bool {
    if goal.is_habit() || goal.is_completed() || age_days(goal, today) < config.stagnation_days {
        return false;
    }
    let untouched = goal.status == GoalStatus::NotStarted && goal.validated_steps == 0;
    let barely_moving = goal.status == GoalStatus::InProgress
        && f64::from(goal.validated_steps)
            < f64::from(goal.total_steps) * config.stagnation_step_ratio;
    untouched || barely_moving
}

/// The oldest stagnant goal, with a count of the others.
pub(super) fn stagnation(
    goals: &[Goal],
    today: NaiveDate,
    config: &InsightsConfig,
) -> Option<PactInsight> {
    let stagnant: Vec<&Goal> = goals
        .iter()
        .filter(|g| is_stagnant(g, today, config))
        .collect();

    // First found wins on equal age.
    let oldest = stagnant.iter().copied().fold(None, |best: Option<&Goal>, g| match best {
        Some(b) if age_days(b, today) >= age_days(g, today) => Some(b),
        _ => Some(g),
    })?;

    let others = stagnant.len() - 1;
    let suffix = if others > 0 {
        format!(" (+{others} more)")
    } else {
        String::new()
    };

    Some(
        PactInsight::new(
            format!("stagnation-{}", oldest.id),
            InsightLevel::Warning,
            "Stalled objective",
            format!(
                "\"{}\" has barely moved in {} days.{suffix}",
                oldest.name,
                age_days(oldest, today)
            ),
        )
        .for_goal(oldest)
        .with_action("Resume goal", goal_route(oldest)),
    )
}

/// One warning per habit whose check ratio has dropped too low.
pub(super) fn habit_danger(goals: &[Goal], config: &InsightsConfig) -> Vec<PactInsight> {
    goals
        .iter()
        .filter(|g| g.is_habit() && g.habit_checks.len() >= config.habit_min_checks)
        .filter_map(|g| {
            let total = g.habit_checks.len();
            let checked = g.habit_checked_count();
            let ratio = checked as f64 / total as f64;
            (ratio < config.habit_danger_ratio).then(|| {
                PactInsight::new(
                    format!("habit-danger-{}", g.id),
                    InsightLevel::Warning,
                    "Habit slipping",
                    format!(
                        "\"{}\" was kept on {checked} of the last {total} days ({:.0}%).",
                        g.name,
                        ratio * 100.0
                    ),
                )
                .for_goal(g)
                .with_action("Check in", goal_route(g))
            })
        })
        .collect()
}

pub(super) fn momentum(goals: &[Goal], config: &InsightsConfig) -> Option<PactInsight> {
    let tracked = || goals.iter().filter(|g| !g.is_habit());
    let completed = tracked()
        .filter(|g| g.status == GoalStatus::FullyCompleted)
        .count();
    let in_progress = tracked()
        .filter(|g| g.status == GoalStatus::InProgress)
        .count();

    if completed >= config.momentum_completed {
        Some(PactInsight::new(
            "momentum-strong",
            InsightLevel::Success,
            "Strong momentum",
            format!("{completed} goals completed. Keep the cadence."),
        ))
    } else if completed > 0 && in_progress > 0 {
        Some(PactInsight::new(
            "momentum-building",
            InsightLevel::Info,
            "Momentum building",
            format!("{completed} done, {in_progress} in progress."),
        ))
    } else {
        None
    }
}

/// Aggregate step progress across active focus goals.
pub(super) fn focus_progress(goals: &[Goal], config: &InsightsConfig) -> Option<PactInsight> {
    let active: Vec<&Goal> = goals
        .iter()
        .filter(|g| g.is_focus && !g.is_completed())
        .collect();
    if active.is_empty() {
        return None;
    }

    let total: u64 = active.iter().map(|g| u64::from(g.total_steps)).sum();
    let validated: u64 = active
        .iter()
        .map(|g| u64::from(g.clamped_validated_steps()))
        .sum();
    let pct = if total == 0 {
        0
    } else {
        (validated as f64 / total as f64 * 100.0).round() as u32
    };

    let level = if pct >= config.focus_success_pct {
        InsightLevel::Success
    } else {
        InsightLevel::Info
    };

    Some(
        PactInsight::new(
            "focus-progress",
            level,
            "Focus progress",
            format!("{} focus goal(s) at {pct}% of their steps.", active.len()),
        )
        .with_action("Open focus goals", "/goals?filter=focus"),
    )
}

pub(super) fn empty_state() -> PactInsight {
    PactInsight::new(
        "empty-state",
        InsightLevel::Info,
        "Awaiting directives",
        "No goals on record yet. Define your first objective to begin the analysis.".to_string(),
    )
    .with_action("Create a goal", "/goals/new")
}
