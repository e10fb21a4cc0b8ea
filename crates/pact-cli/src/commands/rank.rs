use clap::Subcommand;
use pact_core::{ProgressStore, Rank};

use super::{open_service, print_json, CmdResult};

#[derive(Subcommand)]
pub enum RankAction {
    /// Add a rank to the ladder
    Add {
        /// Rank name
        name: String,
        /// XP threshold (unique per user)
        min_points: u64,
    },
    /// List ranks, lowest first
    List,
    /// Current XP and rank placement
    Show,
}

pub fn run(user: Option<String>, action: RankAction) -> CmdResult {
    let service = open_service(user)?;
    let user_id = service.session().require_user()?;

    match action {
        RankAction::Add { name, min_points } => {
            let rank = Rank::new(user_id, name, min_points);
            service.store().add_rank(&rank)?;
            print_json(&rank)
        }
        RankAction::List => print_json(&service.store().list_ranks(user_id)?),
        RankAction::Show => print_json(&service.compute_rank_xp()?),
    }
}
