//! Pact analysis: short, prioritized observations about goal state.
//!
//! [`generate_insights`] is a pure function over a pact and its goals. Each
//! rule fires zero or more insights; the merged list is stable-sorted by
//! level and truncated to `max_insights`.

mod rules;

use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Goal, Pact};
use crate::storage::InsightsConfig;

/// Status lines shown while the analysis "boots", in display order.
pub const BOOT_PHASES: [&str; 7] = [
    "Establishing secure link...",
    "Loading pact parameters...",
    "Scanning active objectives...",
    "Measuring step velocity...",
    "Checking habit integrity...",
    "Cross-referencing deadlines...",
    "Analysis complete.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightLevel {
    Critical,
    Warning,
    Info,
    Success,
}

impl InsightLevel {
    /// Higher sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            InsightLevel::Critical => 3,
            InsightLevel::Warning => 2,
            InsightLevel::Info => 1,
            InsightLevel::Success => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PactInsight {
    /// Stable per rule and goal
    pub id: String,
    pub level: InsightLevel,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_route: Option<String>,
}

impl PactInsight {
    fn new(id: impl Into<String>, level: InsightLevel, title: &str, body: String) -> Self {
        Self {
            id: id.into(),
            level,
            title: title.to_string(),
            body,
            goal_id: None,
            goal_name: None,
            action_label: None,
            action_route: None,
        }
    }

    fn for_goal(mut self, goal: &Goal) -> Self {
        self.goal_id = Some(goal.id.clone());
        self.goal_name = Some(goal.name.clone());
        self
    }

    fn with_action(mut self, label: &str, route: impl Into<String>) -> Self {
        self.action_label = Some(label.to_string());
        self.action_route = Some(route.into());
        self
    }
}

/// Run every rule and return at most `config.max_insights` insights,
/// highest level first, rule order preserved within a level.
pub fn generate_insights(
    pact: Option<&Pact>,
    goals: &[Goal],
    today: NaiveDate,
    config: &InsightsConfig,
) -> Vec<PactInsight> {
    if goals.is_empty() {
        return vec![rules::empty_state()];
    }

    let mut insights = Vec::new();
    if let Some(pact) = pact {
        insights.extend(rules::deadline_proximity(pact, goals, today, config));
    }
    insights.extend(rules::stagnation(goals, today, config));
    insights.extend(rules::habit_danger(goals, config));
    insights.extend(rules::momentum(goals, config));
    insights.extend(rules::focus_progress(goals, config));

    insights.sort_by_key(|i| Reverse(i.level.priority()));
    insights.truncate(config.max_insights);
    insights
}
