//! Achievement rule engine.
//!
//! Definitions pair a typed [`Condition`] with display metadata. The engine
//! checks every locked definition against the user's tracking row and records
//! unlocks through the store's primary key, so repeated or concurrent
//! evaluation never unlocks an achievement twice.

mod catalog;
mod condition;
mod engine;

pub use catalog::{AchievementCatalog, AchievementCategory, AchievementDefinition, Rarity};
pub use condition::{CompletionContext, Condition, EvaluationContext};
pub use engine::{AchievementEngine, AchievementStatus, UnlockNotice, UserAchievement, HIDDEN_NAME};
