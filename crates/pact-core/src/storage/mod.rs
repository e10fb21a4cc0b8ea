mod config;
pub mod database;
pub mod migrations;
mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, InsightsConfig, ProgressionConfig, StreakConfig, TrackingConfig};
pub use database::Database;
pub use store::{ProgressStore, PromoRedemption};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/pact[-dev]/` based on PACT_ENV.
///
/// Set PACT_ENV=dev to use development data directory. PACT_DATA_DIR
/// overrides both.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("PACT_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("PACT_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pact-dev")
            } else {
                base_dir.join("pact")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
