//! User-defined rank ladder.

use serde::{Deserialize, Serialize};

/// A named XP threshold tier. Thresholds are unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub min_points: u64,
}

impl Rank {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, min_points: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            min_points,
        }
    }
}
