//! Database schema migrations for pact.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 4;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }
    if current_version < 4 {
        migrate_v4(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: pacts, goals, steps and the rank ladder.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS pacts (
            user_id     TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            mantra      TEXT,
            symbol      TEXT,
            start_date  TEXT,
            end_date    TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS goals (
            id                  TEXT PRIMARY KEY,
            user_id             TEXT NOT NULL,
            name                TEXT NOT NULL,
            category            TEXT NOT NULL DEFAULT '',
            difficulty          TEXT NOT NULL,
            goal_type           TEXT NOT NULL DEFAULT 'standard',
            status              TEXT NOT NULL DEFAULT 'not_started',
            total_steps         INTEGER NOT NULL DEFAULT 0,
            validated_steps     INTEGER NOT NULL DEFAULT 0,
            potential_score     INTEGER NOT NULL DEFAULT 0,
            is_focus            INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL,
            completion_date     TEXT,
            habit_duration_days INTEGER,
            habit_checks        TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS steps (
            id              TEXT PRIMARY KEY,
            goal_id         TEXT NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
            title           TEXT NOT NULL DEFAULT '',
            status          TEXT NOT NULL DEFAULT 'pending',
            sort_order      INTEGER NOT NULL,
            completion_date TEXT,
            UNIQUE(goal_id, sort_order)
        );

        CREATE TABLE IF NOT EXISTS ranks (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            name        TEXT NOT NULL,
            min_points  INTEGER NOT NULL,
            UNIQUE(user_id, min_points)
        );

        CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_steps_goal ON steps(goal_id, sort_order);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: achievement tracking counters and unlocks.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS achievement_tracking (
            user_id                     TEXT PRIMARY KEY,
            consecutive_login_days      INTEGER NOT NULL DEFAULT 0,
            last_login_date             TEXT,
            logins_at_same_hour_streak  INTEGER NOT NULL DEFAULT 0,
            usual_login_hour            INTEGER,
            midnight_logins_count       INTEGER NOT NULL DEFAULT 0,
            total_goals_created         INTEGER NOT NULL DEFAULT 0,
            easy_goals_created          INTEGER NOT NULL DEFAULT 0,
            medium_goals_created        INTEGER NOT NULL DEFAULT 0,
            hard_goals_created          INTEGER NOT NULL DEFAULT 0,
            extreme_goals_created       INTEGER NOT NULL DEFAULT 0,
            impossible_goals_created    INTEGER NOT NULL DEFAULT 0,
            custom_goals_created        INTEGER NOT NULL DEFAULT 0,
            goals_completed_total       INTEGER NOT NULL DEFAULT 0,
            easy_goals_completed        INTEGER NOT NULL DEFAULT 0,
            medium_goals_completed      INTEGER NOT NULL DEFAULT 0,
            hard_goals_completed        INTEGER NOT NULL DEFAULT 0,
            extreme_goals_completed     INTEGER NOT NULL DEFAULT 0,
            impossible_goals_completed  INTEGER NOT NULL DEFAULT 0,
            custom_goals_completed      INTEGER NOT NULL DEFAULT 0,
            steps_completed_total       INTEGER NOT NULL DEFAULT 0,
            has_pact                    INTEGER NOT NULL DEFAULT 0,
            has_edited_pact             INTEGER NOT NULL DEFAULT 0,
            current_rank_tier           INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS user_achievements (
            user_id         TEXT NOT NULL,
            achievement_key TEXT NOT NULL,
            unlocked_at     TEXT NOT NULL,
            PRIMARY KEY (user_id, achievement_key)
        );",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

/// Migration v3: health check-in streaks.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS health_streaks (
            user_id             TEXT PRIMARY KEY,
            current_streak      INTEGER NOT NULL DEFAULT 0,
            longest_streak      INTEGER NOT NULL DEFAULT 0,
            last_checkin_date   TEXT,
            total_checkins      INTEGER NOT NULL DEFAULT 0
        );",
    )?;

    set_schema_version(&tx, 3)?;
    tx.commit()?;
    Ok(())
}

/// Migration v4: promo codes and per-user redemptions.
fn migrate_v4(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS promo_codes (
            code            TEXT PRIMARY KEY,
            reward_type     TEXT NOT NULL,
            reward_amount   INTEGER NOT NULL,
            max_redemptions INTEGER,
            redeemed_count  INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS promo_redemptions (
            user_id     TEXT NOT NULL,
            code        TEXT NOT NULL REFERENCES promo_codes(code),
            redeemed_at TEXT NOT NULL,
            PRIMARY KEY (user_id, code)
        );",
    )?;

    set_schema_version(&tx, 4)?;
    tx.commit()?;
    Ok(())
}
