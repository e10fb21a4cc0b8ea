//! Achievement definitions and the built-in catalog.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use crate::error::{ConfigError, Result, ValidationError};
use crate::model::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Connection,
    Creation,
    Completion,
    Progression,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    /// Display label, e.g. `"Legendary"`.
    pub fn label(&self) -> String {
        title_case(self.as_str())
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn title_case(s: &str) -> String {
    s.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub key: String,
    pub name: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub condition: Condition,
    #[serde(default)]
    pub is_hidden: bool,
}

impl AchievementDefinition {
    pub fn new(
        key: &str,
        name: &str,
        category: AchievementCategory,
        rarity: Rarity,
        condition: Condition,
    ) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            category,
            rarity,
            condition,
            is_hidden: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }
}

/// A validated set of achievement definitions with unique keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementCatalog {
    definitions: Vec<AchievementDefinition>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "achievement")]
    achievements: Vec<AchievementDefinition>,
}

impl AchievementCatalog {
    /// Build a catalog, rejecting duplicate keys.
    pub fn new(definitions: Vec<AchievementDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.key.as_str()) {
                return Err(ValidationError::DuplicateKey(def.key.clone()).into());
            }
        }
        Ok(Self { definitions })
    }

    /// Parse a catalog from `[[achievement]]` tables.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(s).map_err(ConfigError::from)?;
        Self::new(file.achievements)
    }

    pub fn definitions(&self) -> &[AchievementDefinition] {
        &self.definitions
    }

    pub fn get(&self, key: &str) -> Option<&AchievementDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// The catalog shipped with the engine.
    pub fn builtin() -> Self {
        use AchievementCategory::*;
        use Condition as C;
        use Difficulty as D;
        use Rarity::*;

        let def = AchievementDefinition::new;
        Self {
            definitions: vec![
                // connection
                def("first_login", "Hello, World", Connection, Common, C::ConsecutiveLoginDays(1)),
                def("login_streak_7", "Creature of Habit", Connection, Uncommon, C::ConsecutiveLoginDays(7)),
                def("login_streak_30", "Unbroken Chain", Connection, Epic, C::ConsecutiveLoginDays(30)),
                def("same_hour_5", "Clockwork", Connection, Rare, C::LoginsAtSameHour(5)),
                def("night_owl", "Night Owl", Connection, Uncommon, C::MidnightLogins(5)).hidden(),
                // creation
                def("first_goal", "The First Stone", Creation, Common, C::TotalGoalsCreated(1)),
                def("goals_created_10", "Architect", Creation, Uncommon, C::TotalGoalsCreated(10)),
                def("goals_created_50", "Grand Planner", Creation, Rare, C::TotalGoalsCreated(50)),
                def(
                    "impossible_dreamer",
                    "Impossible Dreamer",
                    Creation,
                    Rare,
                    C::GoalsCreated { difficulty: D::Impossible, value: 1 },
                ),
                def("full_spectrum", "Full Spectrum", Creation, Epic, C::AllDifficultiesCreated),
                // completion
                def("first_completion", "Done and Dusted", Completion, Common, C::GoalsCompletedTotal(1)),
                def("goals_completed_10", "Finisher", Completion, Uncommon, C::GoalsCompletedTotal(10)),
                def("goals_completed_50", "Unstoppable", Completion, Epic, C::GoalsCompletedTotal(50)),
                def(
                    "hard_completed_5",
                    "Hardened",
                    Completion,
                    Rare,
                    C::GoalsCompleted { difficulty: D::Hard, value: 5 },
                ),
                def(
                    "impossible_completed",
                    "Made It Possible",
                    Completion,
                    Legendary,
                    C::GoalsCompleted { difficulty: D::Impossible, value: 1 },
                ),
                def("steps_10", "Baby Steps", Completion, Common, C::StepsCompletedTotal(10)),
                def("steps_100", "Marathon Walker", Completion, Rare, C::StepsCompletedTotal(100)),
                // progression
                def("pact_sealed", "Pact Sealed", Progression, Common, C::HasPact),
                def("pact_revised", "Second Thoughts", Progression, Common, C::HasEditedPact),
                def("rank_2", "Moving Up", Progression, Uncommon, C::RankUp(2)),
                def("rank_5", "Ascendant", Progression, Epic, C::RankUp(5)),
                // special: time-bound completions
                def(
                    "speed_medium",
                    "Quick Study",
                    Special,
                    Uncommon,
                    C::CompletedWithinDuration { difficulty: D::Medium, max_hours: 6 },
                )
                .hidden(),
                def(
                    "speed_hard",
                    "Overnight Success",
                    Special,
                    Rare,
                    C::CompletedWithinDuration { difficulty: D::Hard, max_hours: 24 },
                )
                .hidden(),
                def(
                    "speed_extreme",
                    "Blitz",
                    Special,
                    Epic,
                    C::CompletedWithinDuration { difficulty: D::Extreme, max_hours: 48 },
                )
                .hidden(),
                def(
                    "speed_impossible",
                    "Miracle Week",
                    Special,
                    Legendary,
                    C::CompletedWithinDuration { difficulty: D::Impossible, max_hours: 168 },
                )
                .hidden(),
            ],
        }
    }
}

impl Default for AchievementCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use indoc::indoc;

    #[test]
    fn builtin_keys_are_unique() {
        let builtin = AchievementCatalog::builtin();
        let rebuilt = AchievementCatalog::new(builtin.definitions().to_vec());
        assert!(rebuilt.is_ok());
        assert!(builtin.len() >= 20);
    }

    #[test]
    fn builtin_has_four_time_bound_entries() {
        let bounds: Vec<_> = AchievementCatalog::builtin()
            .definitions()
            .iter()
            .filter_map(|d| match d.condition {
                Condition::CompletedWithinDuration {
                    difficulty,
                    max_hours,
                } => Some((difficulty, max_hours)),
                _ => None,
            })
            .collect();
        assert_eq!(
            bounds,
            vec![
                (Difficulty::Medium, 6),
                (Difficulty::Hard, 24),
                (Difficulty::Extreme, 48),
                (Difficulty::Impossible, 168),
            ]
        );
    }

    #[test]
    fn rarity_label_is_title_cased() {
        assert_eq!(Rarity::Legendary.label(), "Legendary");
        assert_eq!(Rarity::Common.label(), "Common");
        assert_eq!(title_case("very_rare"), "Very Rare");
    }

    #[test]
    fn loads_catalog_from_toml() {
        let catalog = AchievementCatalog::from_toml_str(indoc! {r#"
            [[achievement]]
            key = "first_goal"
            name = "The First Stone"
            category = "creation"
            rarity = "common"
            condition = { type = "total_goals_created", value = 1 }

            [[achievement]]
            key = "mystery"
            name = "Mystery"
            category = "special"
            rarity = "legendary"
            is_hidden = true
            condition = { type = "books_read", value = 3 }
        "#})
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("first_goal").unwrap().condition,
            Condition::TotalGoalsCreated(1)
        );
        let mystery = catalog.get("mystery").unwrap();
        assert!(mystery.is_hidden);
        assert!(matches!(mystery.condition, Condition::Unsupported { .. }));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = AchievementCatalog::from_toml_str(indoc! {r#"
            [[achievement]]
            key = "dup"
            name = "A"
            category = "special"
            rarity = "common"
            condition = { type = "has_pact" }

            [[achievement]]
            key = "dup"
            name = "B"
            category = "special"
            rarity = "rare"
            condition = { type = "has_edited_pact" }
        "#})
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DuplicateKey(ref k)) if k == "dup"
        ));
    }
}
