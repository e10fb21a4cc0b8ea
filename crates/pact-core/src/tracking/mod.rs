//! Behavioral counter store: typed fields, the tracking row, and the
//! event facade that maps user actions to counter operations.

mod counters;
mod events;

pub use counters::{AchievementTracking, CounterField, DifficultyCounts, FlagField};
pub use events::{plan_event, CounterOp, ProgressEvent};
