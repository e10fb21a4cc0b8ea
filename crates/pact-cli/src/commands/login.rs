use chrono::{Local, NaiveDateTime};
use pact_core::{ProgressEvent, ProgressStore};
use serde_json::json;

use super::{open_service, print_json, CmdResult};

pub fn run(user: Option<String>, at: Option<String>) -> CmdResult {
    let at = match at {
        Some(s) => NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M")?,
        None => Local::now().naive_local(),
    };

    let service = open_service(user)?;
    let unlocked = service.track(&ProgressEvent::Login { at });
    let user_id = service.session().require_user()?;
    let tracking = service.store().read_tracking(user_id)?;

    print_json(&json!({
        "consecutive_login_days": tracking.consecutive_login_days,
        "logins_at_same_hour_streak": tracking.logins_at_same_hour_streak,
        "midnight_logins_count": tracking.midnight_logins_count,
        "unlocked": unlocked,
    }))
}
