use clap::Subcommand;

use super::{open_service, print_json, CmdResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// Evaluate the catalog and print new unlocks
    Evaluate,
    /// List achievements with unlock state
    List,
    /// Print the achievement catalog
    Catalog,
}

pub fn run(user: Option<String>, action: AchievementsAction) -> CmdResult {
    let service = open_service(user)?;
    match action {
        AchievementsAction::Evaluate => print_json(&service.evaluate_achievements()?),
        AchievementsAction::List => print_json(&service.list_achievements()?),
        AchievementsAction::Catalog => print_json(service.catalog().definitions()),
    }
}
