use chrono::NaiveDate;

use super::{open_service, print_json, CmdResult};

pub fn run(user: Option<String>, date: Option<NaiveDate>) -> CmdResult {
    let service = open_service(user)?;
    let insights = match date {
        Some(date) => service.generate_insights_on(date)?,
        None => service.generate_insights()?,
    };
    print_json(&insights)
}
