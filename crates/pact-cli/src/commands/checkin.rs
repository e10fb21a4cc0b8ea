use chrono::NaiveDate;
use serde_json::json;

use super::{open_service, print_json, CmdResult};

pub fn run(user: Option<String>, date: Option<NaiveDate>) -> CmdResult {
    let service = open_service(user)?;
    let outcome = match date {
        Some(date) => service.record_check_in_on(date)?,
        None => service.record_check_in()?,
    };
    let message = outcome.milestone.map(|m| m.message());
    print_json(&json!({ "outcome": outcome, "message": message }))
}
