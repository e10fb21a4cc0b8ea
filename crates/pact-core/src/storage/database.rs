//! SQLite-backed record store.
//!
//! Provides persistent storage for:
//! - Pacts, goals, steps and rank ladders
//! - Per-user achievement tracking counters and unlocks
//! - Health check-in streaks
//! - Promo codes and redemptions

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::migrations;
use super::store::{ProgressStore, PromoRedemption};
use crate::achievements::UserAchievement;
use crate::error::{CoreError, DatabaseError, Result};
use crate::model::{Goal, GoalStatus, Pact, Rank, Step, StepStatus};
use crate::streak::HealthStreak;
use crate::tracking::{AchievementTracking, CounterField, DifficultyCounts, FlagField};

const GOAL_COLUMNS: &str = "id, user_id, name, category, difficulty, goal_type, status,
    total_steps, validated_steps, potential_score, is_focus, created_at,
    completion_date, habit_duration_days, habit_checks";

const TRACKING_COLUMNS: &str = "user_id, consecutive_login_days, last_login_date,
    logins_at_same_hour_streak, usual_login_hour, midnight_logins_count,
    total_goals_created, easy_goals_created, medium_goals_created, hard_goals_created,
    extreme_goals_created, impossible_goals_created, custom_goals_created,
    goals_completed_total, easy_goals_completed, medium_goals_completed,
    hard_goals_completed, extreme_goals_completed, impossible_goals_completed,
    custom_goals_completed, steps_completed_total, has_pact, has_edited_pact,
    current_rank_tier";

// === Helper Functions ===

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

/// Parse an enum column stored as its snake_case name
fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

fn parse_datetime(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_optional_datetime(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn parse_optional_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse::<NaiveDate>().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn row_to_goal(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
    let habit_checks_json: String = row.get(14)?;
    let habit_checks: Vec<bool> =
        serde_json::from_str(&habit_checks_json).map_err(|e| conversion_error(14, e))?;

    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        difficulty: parse_column(row, 4)?,
        goal_type: parse_column(row, 5)?,
        status: parse_column(row, 6)?,
        total_steps: row.get(7)?,
        validated_steps: row.get(8)?,
        potential_score: row.get(9)?,
        is_focus: row.get(10)?,
        created_at: parse_datetime(row, 11)?,
        completion_date: parse_optional_datetime(row, 12)?,
        habit_duration_days: row.get(13)?,
        habit_checks,
    })
}

fn row_to_step(row: &rusqlite::Row) -> rusqlite::Result<Step> {
    Ok(Step {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        title: row.get(2)?,
        status: parse_column(row, 3)?,
        order: row.get(4)?,
        completion_date: parse_optional_datetime(row, 5)?,
    })
}

fn row_to_tracking(row: &rusqlite::Row) -> rusqlite::Result<AchievementTracking> {
    let counts = |start: usize| -> rusqlite::Result<DifficultyCounts> {
        Ok(DifficultyCounts {
            easy: row.get(start)?,
            medium: row.get(start + 1)?,
            hard: row.get(start + 2)?,
            extreme: row.get(start + 3)?,
            impossible: row.get(start + 4)?,
            custom: row.get(start + 5)?,
        })
    };

    Ok(AchievementTracking {
        user_id: row.get(0)?,
        consecutive_login_days: row.get(1)?,
        last_login_date: parse_optional_date(row, 2)?,
        logins_at_same_hour_streak: row.get(3)?,
        usual_login_hour: row.get(4)?,
        midnight_logins_count: row.get(5)?,
        total_goals_created: row.get(6)?,
        goals_created: counts(7)?,
        goals_completed_total: row.get(13)?,
        goals_completed: counts(14)?,
        steps_completed_total: row.get(20)?,
        has_pact: row.get(21)?,
        has_edited_pact: row.get(22)?,
        current_rank_tier: row.get(23)?,
    })
}

/// SQLite database holding all engine state.
///
/// One `Database` is one client connection; open one per thread or process
/// on the same file to share state. Counter updates are single atomic
/// statements, so concurrent clients never lose increments.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/pact/pact.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("pact.db");
        Self::open_path(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // === Pacts ===

    /// Insert or update the user's pact. Returns `true` when it was created.
    pub fn upsert_pact(&self, pact: &Pact) -> Result<bool> {
        let existed: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM pacts WHERE user_id = ?1",
                params![pact.user_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        self.conn.execute(
            "INSERT INTO pacts (user_id, name, mantra, symbol, start_date, end_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id) DO UPDATE SET
                name = excluded.name,
                mantra = excluded.mantra,
                symbol = excluded.symbol,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                updated_at = excluded.updated_at",
            params![
                pact.user_id,
                pact.name,
                pact.mantra,
                pact.symbol,
                pact.start_date.map(|d| d.to_string()),
                pact.end_date.map(|d| d.to_string()),
                pact.created_at.to_rfc3339(),
                pact.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(!existed)
    }

    // === Goals ===

    pub fn create_goal(&self, goal: &Goal) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO goals ({GOAL_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                goal.id,
                goal.user_id,
                goal.name,
                goal.category,
                goal.difficulty.as_str(),
                goal.goal_type.as_str(),
                goal.status.as_str(),
                goal.total_steps,
                goal.validated_steps,
                goal.potential_score,
                goal.is_focus,
                goal.created_at.to_rfc3339(),
                goal.completion_date.map(|d| d.to_rfc3339()),
                goal.habit_duration_days,
                serde_json::to_string(&goal.habit_checks)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_goal(&self, id: &str) -> Result<Option<Goal>> {
        let goal = self
            .conn
            .query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
                params![id],
                row_to_goal,
            )
            .optional()?;
        Ok(goal)
    }

    fn require_goal(&self, id: &str) -> Result<Goal> {
        self.get_goal(id)?.ok_or_else(|| CoreError::NotFound {
            entity: "goal",
            id: id.to_string(),
        })
    }

    /// Change a goal's status, stamping or clearing the completion date.
    pub fn update_goal_status(
        &self,
        id: &str,
        status: GoalStatus,
        at: DateTime<Utc>,
    ) -> Result<Goal> {
        let completion = status.is_completed().then(|| at.to_rfc3339());
        let changed = self.conn.execute(
            "UPDATE goals SET status = ?2, completion_date = ?3 WHERE id = ?1",
            params![id, status.as_str(), completion],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                entity: "goal",
                id: id.to_string(),
            });
        }
        self.require_goal(id)
    }

    /// Mark a goal fully completed.
    ///
    /// Returns `None` when the goal was already completed or validated. The
    /// guard sits in the `UPDATE`, so concurrent completions report once.
    pub fn complete_goal(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Goal>> {
        let changed = self.conn.execute(
            "UPDATE goals SET status = 'fully_completed', completion_date = ?2
             WHERE id = ?1 AND status NOT IN ('fully_completed', 'validated')",
            params![id, at.to_rfc3339()],
        )?;
        let goal = self.require_goal(id)?;
        Ok((changed == 1).then_some(goal))
    }

    pub fn set_goal_focus(&self, id: &str, is_focus: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE goals SET is_focus = ?2 WHERE id = ?1",
            params![id, is_focus],
        )?;
        Ok(())
    }

    /// Append one day to a habit goal's check array.
    pub fn append_habit_check(&self, goal_id: &str, checked: bool) -> Result<Goal> {
        let mut goal = self.require_goal(goal_id)?;
        goal.habit_checks.push(checked);
        self.conn.execute(
            "UPDATE goals SET habit_checks = ?2 WHERE id = ?1",
            params![goal_id, serde_json::to_string(&goal.habit_checks)?],
        )?;
        Ok(goal)
    }

    // === Steps ===

    /// Append a pending step after the goal's last step.
    pub fn add_step(&self, goal_id: &str, title: &str) -> Result<Step> {
        self.require_goal(goal_id)?;
        let tx = self.conn.unchecked_transaction()?;

        let next_order: u32 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM steps WHERE goal_id = ?1",
            params![goal_id],
            |row| row.get(0),
        )?;
        let step = Step {
            id: uuid::Uuid::new_v4().to_string(),
            goal_id: goal_id.to_string(),
            title: title.to_string(),
            status: StepStatus::Pending,
            order: next_order,
            completion_date: None,
        };
        tx.execute(
            "INSERT INTO steps (id, goal_id, title, status, sort_order, completion_date)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
            params![step.id, step.goal_id, step.title, step.status.as_str(), step.order],
        )?;
        tx.execute(
            "UPDATE goals SET total_steps = total_steps + 1 WHERE id = ?1",
            params![goal_id],
        )?;

        tx.commit()?;
        Ok(step)
    }

    /// Mark a step completed and refresh the owning goal's counts.
    ///
    /// Returns `None` if the step was already completed. A goal that had not
    /// started moves to `in_progress`.
    pub fn complete_step(&self, step_id: &str, at: DateTime<Utc>) -> Result<Option<Step>> {
        let tx = self.conn.unchecked_transaction()?;

        let step = tx
            .query_row(
                "SELECT id, goal_id, title, status, sort_order, completion_date
                 FROM steps WHERE id = ?1",
                params![step_id],
                row_to_step,
            )
            .optional()?
            .ok_or_else(|| CoreError::NotFound {
                entity: "step",
                id: step_id.to_string(),
            })?;
        if step.status == StepStatus::Completed {
            return Ok(None);
        }

        let changed = tx.execute(
            "UPDATE steps SET status = 'completed', completion_date = ?2
             WHERE id = ?1 AND status <> 'completed'",
            params![step_id, at.to_rfc3339()],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        tx.execute(
            "UPDATE goals SET
                validated_steps = (SELECT COUNT(*) FROM steps
                                   WHERE goal_id = ?1 AND status = 'completed'),
                status = CASE status WHEN 'not_started' THEN 'in_progress' ELSE status END
             WHERE id = ?1",
            params![step.goal_id],
        )?;

        tx.commit()?;
        Ok(Some(Step {
            status: StepStatus::Completed,
            completion_date: Some(at),
            ..step
        }))
    }

    // === Ranks ===

    pub fn add_rank(&self, rank: &Rank) -> Result<()> {
        self.conn.execute(
            "INSERT INTO ranks (id, user_id, name, min_points) VALUES (?1, ?2, ?3, ?4)",
            params![rank.id, rank.user_id, rank.name, rank.min_points],
        )?;
        Ok(())
    }

    // === Promo codes ===

    pub fn add_promo_code(
        &self,
        code: &str,
        reward_type: &str,
        reward_amount: i64,
        max_redemptions: Option<u32>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO promo_codes (code, reward_type, reward_amount, max_redemptions)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                normalize_code(code),
                reward_type,
                reward_amount,
                max_redemptions
            ],
        )?;
        Ok(())
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl ProgressStore for Database {
    fn get_pact(&self, user_id: &str) -> Result<Option<Pact>> {
        let pact = self
            .conn
            .query_row(
                "SELECT user_id, name, mantra, symbol, start_date, end_date, created_at, updated_at
                 FROM pacts WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Pact {
                        user_id: row.get(0)?,
                        name: row.get(1)?,
                        mantra: row.get(2)?,
                        symbol: row.get(3)?,
                        start_date: parse_optional_date(row, 4)?,
                        end_date: parse_optional_date(row, 5)?,
                        created_at: parse_datetime(row, 6)?,
                        updated_at: parse_datetime(row, 7)?,
                    })
                },
            )
            .optional()?;
        Ok(pact)
    }

    fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 ORDER BY created_at, id"
        ))?;
        let goals = stmt
            .query_map(params![user_id], row_to_goal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(goals)
    }

    fn list_steps(&self, goal_id: &str) -> Result<Vec<Step>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, goal_id, title, status, sort_order, completion_date
             FROM steps WHERE goal_id = ?1 ORDER BY sort_order",
        )?;
        let steps = stmt
            .query_map(params![goal_id], row_to_step)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(steps)
    }

    fn list_ranks(&self, user_id: &str) -> Result<Vec<Rank>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, min_points FROM ranks
             WHERE user_id = ?1 ORDER BY min_points",
        )?;
        let ranks = stmt
            .query_map(params![user_id], |row| {
                Ok(Rank {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    min_points: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ranks)
    }

    fn read_tracking(&self, user_id: &str) -> Result<AchievementTracking> {
        let tracking = self
            .conn
            .query_row(
                &format!("SELECT {TRACKING_COLUMNS} FROM achievement_tracking WHERE user_id = ?1"),
                params![user_id],
                row_to_tracking,
            )
            .optional()?;
        Ok(tracking.unwrap_or_else(|| AchievementTracking::empty(user_id)))
    }

    fn increment_counter(&self, user_id: &str, field: CounterField, delta: u32) -> Result<()> {
        self.ensure_tracking_row(user_id)?;
        let column = field.column();
        self.conn.execute(
            &format!(
                "UPDATE achievement_tracking SET {column} = {column} + ?2 WHERE user_id = ?1"
            ),
            params![user_id, delta],
        )?;
        Ok(())
    }

    fn set_counter(&self, user_id: &str, field: CounterField, value: u32) -> Result<()> {
        self.ensure_tracking_row(user_id)?;
        self.conn.execute(
            &format!(
                "UPDATE achievement_tracking SET {} = ?2 WHERE user_id = ?1",
                field.column()
            ),
            params![user_id, value],
        )?;
        Ok(())
    }

    fn raise_counter(&self, user_id: &str, field: CounterField, value: u32) -> Result<()> {
        self.ensure_tracking_row(user_id)?;
        let column = field.column();
        self.conn.execute(
            &format!(
                "UPDATE achievement_tracking SET {column} = MAX({column}, ?2) WHERE user_id = ?1"
            ),
            params![user_id, value],
        )?;
        Ok(())
    }

    fn set_flag(&self, user_id: &str, flag: FlagField, value: bool) -> Result<()> {
        self.ensure_tracking_row(user_id)?;
        self.conn.execute(
            &format!(
                "UPDATE achievement_tracking SET {} = ?2 WHERE user_id = ?1",
                flag.column()
            ),
            params![user_id, value],
        )?;
        Ok(())
    }

    fn advance_login_day(&self, user_id: &str, date: NaiveDate, hour: u32) -> Result<bool> {
        self.ensure_tracking_row(user_id)?;
        let yesterday = date.pred_opt().map(|d| d.to_string());
        // SET expressions all read the pre-update row.
        let changed = self.conn.execute(
            "UPDATE achievement_tracking SET
                consecutive_login_days = CASE WHEN last_login_date = ?3
                    THEN consecutive_login_days + 1 ELSE 1 END,
                logins_at_same_hour_streak = CASE
                    WHEN usual_login_hour = ?4 AND logins_at_same_hour_streak > 0
                    THEN logins_at_same_hour_streak + 1 ELSE 1 END,
                usual_login_hour = ?4,
                last_login_date = ?2
             WHERE user_id = ?1 AND (last_login_date IS NULL OR last_login_date <> ?2)",
            params![user_id, date.to_string(), yesterday, hour],
        )?;
        Ok(changed == 1)
    }

    fn unlocked_achievements(&self, user_id: &str) -> Result<Vec<UserAchievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, achievement_key, unlocked_at FROM user_achievements
             WHERE user_id = ?1 ORDER BY unlocked_at, achievement_key",
        )?;
        let unlocked = stmt
            .query_map(params![user_id], |row| {
                Ok(UserAchievement {
                    user_id: row.get(0)?,
                    achievement_key: row.get(1)?,
                    unlocked_at: parse_datetime(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(unlocked)
    }

    fn insert_unlock(&self, user_id: &str, key: &str, unlocked_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO user_achievements (user_id, achievement_key, unlocked_at)
             VALUES (?1, ?2, ?3)",
            params![user_id, key, unlocked_at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn load_health_streak(&self, user_id: &str) -> Result<Option<HealthStreak>> {
        let streak = self
            .conn
            .query_row(
                "SELECT user_id, current_streak, longest_streak, last_checkin_date, total_checkins
                 FROM health_streaks WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(HealthStreak {
                        user_id: row.get(0)?,
                        current_streak: row.get(1)?,
                        longest_streak: row.get(2)?,
                        last_checkin_date: parse_optional_date(row, 3)?,
                        total_checkins: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(streak)
    }

    fn save_health_streak(&self, streak: &HealthStreak) -> Result<()> {
        self.conn.execute(
            "INSERT INTO health_streaks
                (user_id, current_streak, longest_streak, last_checkin_date, total_checkins)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                last_checkin_date = excluded.last_checkin_date,
                total_checkins = excluded.total_checkins",
            params![
                streak.user_id,
                streak.current_streak,
                streak.longest_streak,
                streak.last_checkin_date.map(|d| d.to_string()),
                streak.total_checkins,
            ],
        )?;
        Ok(())
    }

    fn redeem_promo_code(&self, user_id: &str, code: &str) -> Result<PromoRedemption> {
        let code = normalize_code(code);
        let tx = self.conn.unchecked_transaction()?;

        let promo = tx
            .query_row(
                "SELECT reward_type, reward_amount, max_redemptions, redeemed_count
                 FROM promo_codes WHERE code = ?1",
                params![code],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<u32>>(2)?,
                        row.get::<_, u32>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((reward_type, reward_amount, max_redemptions, redeemed_count)) = promo else {
            return Ok(PromoRedemption::rejected("invalid_code"));
        };

        if max_redemptions.is_some_and(|max| redeemed_count >= max) {
            return Ok(PromoRedemption::rejected("code_exhausted"));
        }

        let inserted = tx.execute(
            "INSERT INTO promo_redemptions (user_id, code, redeemed_at) VALUES (?1, ?2, ?3)",
            params![user_id, code, Utc::now().to_rfc3339()],
        );
        if let Err(e) = inserted {
            let err = DatabaseError::from(e);
            if err.is_unique_violation() {
                return Ok(PromoRedemption::rejected("already_redeemed"));
            }
            return Err(err.into());
        }
        tx.execute(
            "UPDATE promo_codes SET redeemed_count = redeemed_count + 1 WHERE code = ?1",
            params![code],
        )?;

        tx.commit()?;
        Ok(PromoRedemption {
            success: true,
            error: None,
            reward_type: Some(reward_type),
            reward_amount: Some(reward_amount),
        })
    }
}

impl Database {
    fn ensure_tracking_row(&self, user_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO achievement_tracking (user_id) VALUES (?1)",
            params![user_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;

    #[test]
    fn goal_roundtrip() {
        let db = Database::open_memory().unwrap();
        let mut goal = Goal::new("u1", "Learn Rust", Difficulty::Hard, 300);
        goal.is_focus = true;
        goal.habit_checks = vec![true, false];
        db.create_goal(&goal).unwrap();

        let loaded = db.get_goal(&goal.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Learn Rust");
        assert_eq!(loaded.difficulty, Difficulty::Hard);
        assert!(loaded.is_focus);
        assert_eq!(loaded.habit_checks, vec![true, false]);
        assert_eq!(db.list_goals("u1").unwrap().len(), 1);
        assert!(db.list_goals("u2").unwrap().is_empty());
    }

    #[test]
    fn steps_maintain_goal_counts() {
        let db = Database::open_memory().unwrap();
        let goal = Goal::new("u1", "Ship", Difficulty::Medium, 100);
        db.create_goal(&goal).unwrap();

        let s1 = db.add_step(&goal.id, "design").unwrap();
        let s2 = db.add_step(&goal.id, "build").unwrap();
        assert_eq!((s1.order, s2.order), (0, 1));

        let done = db.complete_step(&s1.id, Utc::now()).unwrap();
        assert!(done.is_some());
        assert!(db.complete_step(&s1.id, Utc::now()).unwrap().is_none());

        let loaded = db.get_goal(&goal.id).unwrap().unwrap();
        assert_eq!(loaded.total_steps, 2);
        assert_eq!(loaded.validated_steps, 1);
        assert_eq!(loaded.status, GoalStatus::InProgress);
    }

    #[test]
    fn complete_missing_step_is_not_found() {
        let db = Database::open_memory().unwrap();
        let err = db.complete_step("nope", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "step", .. }));
    }

    #[test]
    fn status_update_stamps_completion() {
        let db = Database::open_memory().unwrap();
        let goal = Goal::new("u1", "Ship", Difficulty::Easy, 10);
        db.create_goal(&goal).unwrap();

        let done = db
            .update_goal_status(&goal.id, GoalStatus::FullyCompleted, Utc::now())
            .unwrap();
        assert!(done.completion_date.is_some());

        let paused = db
            .update_goal_status(&goal.id, GoalStatus::Paused, Utc::now())
            .unwrap();
        assert!(paused.completion_date.is_none());
    }

    #[test]
    fn goal_completes_once() {
        let db = Database::open_memory().unwrap();
        let goal = Goal::new("u1", "Ship", Difficulty::Easy, 10);
        db.create_goal(&goal).unwrap();

        let done = db.complete_goal(&goal.id, Utc::now()).unwrap().unwrap();
        assert_eq!(done.status, GoalStatus::FullyCompleted);
        assert!(done.completion_date.is_some());
        assert!(db.complete_goal(&goal.id, Utc::now()).unwrap().is_none());

        db.update_goal_status(&goal.id, GoalStatus::Validated, Utc::now())
            .unwrap();
        assert!(db.complete_goal(&goal.id, Utc::now()).unwrap().is_none());
        assert!(matches!(
            db.complete_goal("missing", Utc::now()),
            Err(CoreError::NotFound { entity: "goal", .. })
        ));
    }

    #[test]
    fn tracking_defaults_and_increments() {
        let db = Database::open_memory().unwrap();
        let empty = db.read_tracking("u1").unwrap();
        assert_eq!(empty, AchievementTracking::empty("u1"));

        db.increment_counter("u1", CounterField::TotalGoalsCreated, 2)
            .unwrap();
        db.increment_counter("u1", CounterField::GoalsCreated(Difficulty::Extreme), 1)
            .unwrap();
        db.raise_counter("u1", CounterField::CurrentRankTier, 3).unwrap();
        db.raise_counter("u1", CounterField::CurrentRankTier, 1).unwrap();
        db.set_flag("u1", FlagField::HasPact, true).unwrap();
        assert!(db
            .advance_login_day("u1", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 8)
            .unwrap());

        let t = db.read_tracking("u1").unwrap();
        assert_eq!(t.total_goals_created, 2);
        assert_eq!(t.goals_created.extreme, 1);
        assert_eq!(t.current_rank_tier, 3);
        assert!(t.has_pact);
        assert_eq!(t.last_login_date, NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn login_day_is_decided_in_the_store() {
        let db = Database::open_memory().unwrap();
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();

        assert!(db.advance_login_day("u1", day(1), 9).unwrap());
        assert!(db.advance_login_day("u1", day(2), 9).unwrap());
        assert!(!db.advance_login_day("u1", day(2), 9).unwrap());
        let t = db.read_tracking("u1").unwrap();
        assert_eq!(t.consecutive_login_days, 2);
        assert_eq!(t.logins_at_same_hour_streak, 2);

        assert!(db.advance_login_day("u1", day(3), 21).unwrap());
        let t = db.read_tracking("u1").unwrap();
        assert_eq!(t.consecutive_login_days, 3);
        assert_eq!(t.logins_at_same_hour_streak, 1);
        assert_eq!(t.usual_login_hour, Some(21));

        assert!(db.advance_login_day("u1", day(9), 21).unwrap());
        let t = db.read_tracking("u1").unwrap();
        assert_eq!(t.consecutive_login_days, 1);
        assert_eq!(t.logins_at_same_hour_streak, 2);
        assert_eq!(t.last_login_date, Some(day(9)));
    }

    #[test]
    fn duplicate_unlock_is_unique_violation() {
        let db = Database::open_memory().unwrap();
        db.insert_unlock("u1", "first_goal", Utc::now()).unwrap();
        let err = db.insert_unlock("u1", "first_goal", Utc::now()).unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(db.unlocked_keys("u1").unwrap().len(), 1);
    }

    #[test]
    fn ranks_listed_ascending() {
        let db = Database::open_memory().unwrap();
        db.add_rank(&Rank::new("u1", "Gold", 500)).unwrap();
        db.add_rank(&Rank::new("u1", "Bronze", 0)).unwrap();
        db.add_rank(&Rank::new("u1", "Silver", 100)).unwrap();
        let names: Vec<_> = db
            .list_ranks("u1")
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Bronze", "Silver", "Gold"]);

        let dup = db.add_rank(&Rank::new("u1", "Also Gold", 500)).unwrap_err();
        assert!(dup.is_unique_violation());
    }

    #[test]
    fn upsert_pact_reports_creation() {
        let db = Database::open_memory().unwrap();
        let mut pact = Pact::new("u1", "Iron Will");
        assert!(db.upsert_pact(&pact).unwrap());
        pact.mantra = Some("Every day".into());
        assert!(!db.upsert_pact(&pact).unwrap());
        let loaded = db.get_pact("u1").unwrap().unwrap();
        assert_eq!(loaded.mantra.as_deref(), Some("Every day"));
    }

    #[test]
    fn promo_redemption_paths() {
        let db = Database::open_memory().unwrap();
        db.add_promo_code("launch", "gems", 50, Some(1)).unwrap();

        assert_eq!(
            db.redeem_promo_code("u1", "nope").unwrap().error.as_deref(),
            Some("invalid_code")
        );

        let ok = db.redeem_promo_code("u1", " Launch ").unwrap();
        assert!(ok.success);
        assert_eq!(ok.reward_type.as_deref(), Some("gems"));
        assert_eq!(ok.reward_amount, Some(50));

        assert_eq!(
            db.redeem_promo_code("u2", "LAUNCH").unwrap().error.as_deref(),
            Some("code_exhausted")
        );
    }

    #[test]
    fn promo_redeemed_twice_by_same_user() {
        let db = Database::open_memory().unwrap();
        db.add_promo_code("WELCOME", "xp_boost", 2, None).unwrap();
        assert!(db.redeem_promo_code("u1", "welcome").unwrap().success);
        assert_eq!(
            db.redeem_promo_code("u1", "welcome").unwrap().error.as_deref(),
            Some("already_redeemed")
        );
    }

    #[test]
    fn health_streak_upsert() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_health_streak("u1").unwrap().is_none());
        let mut streak = HealthStreak {
            user_id: "u1".into(),
            current_streak: 1,
            longest_streak: 1,
            last_checkin_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            total_checkins: 1,
        };
        db.save_health_streak(&streak).unwrap();
        streak.current_streak = 2;
        db.save_health_streak(&streak).unwrap();
        assert_eq!(db.load_health_streak("u1").unwrap(), Some(streak));
    }
}
