//! # Pact Core Library
//!
//! This library provides the progression and insight engine behind Pact, a
//! gamified goal tracker. It follows a CLI-first philosophy: every operation
//! is available through the standalone `pact` binary, and any other front-end
//! is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Tracking**: behavioral counters fed by [`ProgressEvent`]s and applied
//!   atomically by the store
//! - **Achievements**: a typed condition catalog evaluated against the
//!   counters, with idempotent unlocks
//! - **Rank/XP**: experience points and rank placement derived from goals
//! - **Insights**: a pure, prioritized and capped set of observations
//! - **Streaks**: daily check-in state machine with milestones
//! - **Storage**: SQLite persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ProgressService`]: the outward operations for one session
//! - [`Database`]: SQLite implementation of [`ProgressStore`]
//! - [`Config`]: engine configuration management

pub mod achievements;
pub mod error;
pub mod insights;
pub mod model;
pub mod rank;
pub mod service;
pub mod snapshot;
pub mod storage;
pub mod streak;
pub mod tracking;

pub use achievements::{
    AchievementCatalog, AchievementDefinition, AchievementEngine, AchievementStatus, Condition,
    Rarity, UnlockNotice,
};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use insights::{generate_insights, InsightLevel, PactInsight, BOOT_PHASES};
pub use model::{Difficulty, Goal, GoalStatus, GoalType, Pact, Rank, Step, StepStatus};
pub use rank::{compute_rank_xp, RankXpData};
pub use service::{ProgressService, Session};
pub use snapshot::ProgressSnapshot;
pub use storage::{Config, Database, ProgressStore, PromoRedemption};
pub use streak::{check_in, CheckInOutcome, HealthStreak, StreakMilestone};
pub use tracking::{AchievementTracking, CounterField, FlagField, ProgressEvent};
