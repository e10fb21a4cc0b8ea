//! Read-only view of a user's progress, loaded in one pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Goal, Pact, Rank, Step};
use crate::storage::ProgressStore;

/// Pact, goals, steps and rank ladder of one user.
///
/// Goals are ordered by creation, steps by `order`, ranks ascending by
/// `min_points`. Stored counts are kept as read, so anomalies such as
/// `validated_steps > total_steps` stay visible to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub user_id: String,
    pub pact: Option<Pact>,
    pub goals: Vec<Goal>,
    /// Keyed by goal id
    pub steps: HashMap<String, Vec<Step>>,
    pub ranks: Vec<Rank>,
}

impl ProgressSnapshot {
    pub fn load<S: ProgressStore + ?Sized>(store: &S, user_id: &str) -> Result<Self> {
        let pact = store.get_pact(user_id)?;

        let mut goals = store.list_goals(user_id)?;
        goals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut steps = HashMap::with_capacity(goals.len());
        for goal in &goals {
            let mut goal_steps = store.list_steps(&goal.id)?;
            goal_steps.sort_by_key(|s| s.order);
            steps.insert(goal.id.clone(), goal_steps);
        }

        let mut ranks = store.list_ranks(user_id)?;
        ranks.sort_by_key(|r| r.min_points);

        Ok(Self {
            user_id: user_id.to_string(),
            pact,
            goals,
            steps,
            ranks,
        })
    }

    pub fn steps_for(&self, goal_id: &str) -> &[Step] {
        self.steps.get(goal_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn focus_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter().filter(|g| g.is_focus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use crate::storage::Database;
    use chrono::{Duration, Utc};

    #[test]
    fn loads_normalized_snapshot() {
        let db = Database::open_memory().unwrap();

        let mut newer = Goal::new("u1", "newer", Difficulty::Easy, 10);
        newer.is_focus = true;
        let mut older = Goal::new("u1", "older", Difficulty::Hard, 40);
        older.created_at = Utc::now() - Duration::days(3);
        db.create_goal(&newer).unwrap();
        db.create_goal(&older).unwrap();
        db.create_goal(&Goal::new("u2", "other user", Difficulty::Easy, 5))
            .unwrap();

        db.add_step(&older.id, "one").unwrap();
        db.add_step(&older.id, "two").unwrap();

        db.add_rank(&Rank::new("u1", "Adept", 100)).unwrap();
        db.add_rank(&Rank::new("u1", "Novice", 0)).unwrap();

        let snap = ProgressSnapshot::load(&db, "u1").unwrap();
        assert!(snap.pact.is_none());
        let names: Vec<_> = snap.goals.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["older", "newer"]);
        assert_eq!(snap.goals[0].total_steps, 2);

        let titles: Vec<_> = snap.steps_for(&older.id).iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two"]);
        assert!(snap.steps_for(&newer.id).is_empty());
        assert!(snap.steps_for("missing").is_empty());

        assert_eq!(snap.ranks[0].name, "Novice");
        assert_eq!(snap.focus_goals().count(), 1);
    }
}
