use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use pact_core::{Pact, ProgressEvent, ProgressStore};
use serde_json::json;

use super::{open_service, print_json, CmdResult};

#[derive(Subcommand)]
pub enum PactAction {
    /// Create the pact, or edit it if it exists
    Set {
        /// Pact name
        name: String,
        #[arg(long)]
        mantra: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        /// Timeline start (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Timeline end (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Show the current pact
    Show,
}

pub fn run(user: Option<String>, action: PactAction) -> CmdResult {
    let service = open_service(user)?;
    let user_id = service.session().require_user()?;
    let db = service.store();

    match action {
        PactAction::Set {
            name,
            mantra,
            symbol,
            start,
            end,
        } => {
            let mut pact = db
                .get_pact(user_id)?
                .unwrap_or_else(|| Pact::new(user_id, name.as_str()));
            pact.name = name;
            pact.mantra = mantra.or(pact.mantra);
            pact.symbol = symbol.or(pact.symbol);
            pact.start_date = start.or(pact.start_date);
            pact.end_date = end.or(pact.end_date);
            pact.updated_at = Utc::now();

            let created = db.upsert_pact(&pact)?;
            let event = if created {
                ProgressEvent::PactCreated
            } else {
                ProgressEvent::PactEdited
            };
            let unlocked = service.track(&event);
            print_json(&json!({ "pact": pact, "created": created, "unlocked": unlocked }))
        }
        PactAction::Show => match db.get_pact(user_id)? {
            Some(pact) => print_json(&pact),
            None => Err(format!("no pact for user {user_id}").into()),
        },
    }
}
