use chrono::Utc;
use clap::Subcommand;
use pact_core::{Difficulty, Goal, GoalStatus, GoalType, ProgressEvent, ProgressStore};
use serde_json::json;

use super::{open_service, print_json, CmdResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a goal
    Add {
        /// Goal name
        name: String,
        /// easy, medium, hard, extreme, impossible or custom
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Maximum XP awardable
        #[arg(long, default_value = "100")]
        score: u32,
        /// standard, habit or super
        #[arg(long = "type", default_value = "standard")]
        goal_type: GoalType,
        /// Free-form category label
        #[arg(long, default_value = "")]
        category: String,
        /// Mark as a focus goal
        #[arg(long)]
        focus: bool,
        /// Habit length in days
        #[arg(long)]
        habit_days: Option<u32>,
    },
    /// List goals, oldest first
    List,
    /// Mark a goal in progress
    Start { id: String },
    /// Mark a goal fully completed
    Complete { id: String },
    /// Pause a goal
    Pause { id: String },
    /// Append a step to a goal
    StepAdd {
        goal_id: String,
        /// Step title
        title: String,
    },
    /// Complete a step
    StepComplete { step_id: String },
    /// Record today's entry for a habit goal
    HabitCheck {
        goal_id: String,
        /// Record a missed day instead of a kept one
        #[arg(long)]
        missed: bool,
    },
}

pub fn run(user: Option<String>, action: GoalAction) -> CmdResult {
    let service = open_service(user)?;
    let user_id = service.session().require_user()?;
    let db = service.store();

    match action {
        GoalAction::Add {
            name,
            difficulty,
            score,
            goal_type,
            category,
            focus,
            habit_days,
        } => {
            let mut goal = Goal::new(user_id, name, difficulty, score);
            goal.goal_type = goal_type;
            goal.category = category;
            goal.is_focus = focus;
            goal.habit_duration_days = habit_days;
            db.create_goal(&goal)?;

            let unlocked = service.track(&ProgressEvent::GoalCreated { difficulty });
            print_json(&json!({ "goal": goal, "unlocked": unlocked }))
        }
        GoalAction::List => print_json(&db.list_goals(user_id)?),
        GoalAction::Start { id } => {
            print_json(&db.update_goal_status(&id, GoalStatus::InProgress, Utc::now())?)
        }
        GoalAction::Pause { id } => {
            print_json(&db.update_goal_status(&id, GoalStatus::Paused, Utc::now())?)
        }
        GoalAction::Complete { id } => {
            let completed_at = Utc::now();
            match db.complete_goal(&id, completed_at)? {
                Some(goal) => {
                    let unlocked = service.track(&ProgressEvent::GoalCompleted {
                        goal_id: goal.id.clone(),
                        difficulty: goal.difficulty,
                        created_at: goal.created_at,
                        completed_at,
                    });
                    print_json(&json!({ "goal": goal, "unlocked": unlocked }))
                }
                None => {
                    let goal = db.get_goal(&id)?;
                    print_json(&json!({ "goal": goal, "unlocked": [], "already_completed": true }))
                }
            }
        }
        GoalAction::StepAdd { goal_id, title } => print_json(&db.add_step(&goal_id, &title)?),
        GoalAction::StepComplete { step_id } => match db.complete_step(&step_id, Utc::now())? {
            Some(step) => {
                let unlocked = service.track(&ProgressEvent::StepsCompleted { count: 1 });
                print_json(&json!({ "step": step, "unlocked": unlocked }))
            }
            None => print_json(&json!({ "step_id": step_id, "already_completed": true })),
        },
        GoalAction::HabitCheck { goal_id, missed } => {
            print_json(&db.append_habit_check(&goal_id, !missed)?)
        }
    }
}
