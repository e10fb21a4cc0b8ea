//! Domain records shared by every engine component.

mod goal;
mod pact;
mod rank;

pub use goal::{Difficulty, Goal, GoalStatus, GoalType, Step, StepStatus};
pub use pact::Pact;
pub use rank::Rank;
