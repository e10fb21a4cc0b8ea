//! Command implementations. Every command prints JSON on stdout.

pub mod achievements;
pub mod checkin;
pub mod config;
pub mod goal;
pub mod insights;
pub mod login;
pub mod pact;
pub mod promo;
pub mod rank;

use pact_core::{Config, Database, ProgressService, Session};
use serde::Serialize;

pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Service for the `--user` flag, falling back to the configured user.
pub fn open_service(user: Option<String>) -> CmdResult<ProgressService<Database>> {
    let config = Config::load()?;
    let session = Session::new(user.or_else(|| config.user_id.clone()));
    tracing::debug!(user = ?session.user_id(), "opening progress service");
    let db = Database::open()?;
    Ok(ProgressService::new(db, config, session))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
