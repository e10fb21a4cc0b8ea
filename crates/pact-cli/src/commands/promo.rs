use clap::Subcommand;

use super::{open_service, print_json, CmdResult};

#[derive(Subcommand)]
pub enum PromoAction {
    /// Redeem a promo code
    Redeem { code: String },
    /// Register a promo code
    Add {
        code: String,
        /// Reward kind, e.g. "gems"
        reward_type: String,
        reward_amount: i64,
        /// Maximum number of redemptions across users
        #[arg(long)]
        max: Option<u32>,
    },
}

pub fn run(user: Option<String>, action: PromoAction) -> CmdResult {
    let service = open_service(user)?;
    match action {
        PromoAction::Redeem { code } => print_json(&service.redeem_promo_code(&code)?),
        PromoAction::Add {
            code,
            reward_type,
            reward_amount,
            max,
        } => {
            service
                .store()
                .add_promo_code(&code, &reward_type, reward_amount, max)?;
            print_json(&serde_json::json!({ "code": code.trim().to_uppercase(), "added": true }))
        }
    }
}
