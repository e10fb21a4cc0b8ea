//! The engine's outward operations for one session.
//!
//! [`ProgressService`] owns a store, the engine configuration and the
//! session identity. Every write path goes through [`ProgressService::record_event`],
//! which plans counter updates, applies them and re-evaluates achievements.

use chrono::{Local, NaiveDate, Utc};

use crate::achievements::{
    AchievementCatalog, AchievementEngine, AchievementStatus, CompletionContext, UnlockNotice,
};
use crate::error::{CoreError, Result};
use crate::insights::{self, PactInsight};
use crate::rank::{self, RankXpData};
use crate::snapshot::ProgressSnapshot;
use crate::storage::{Config, ProgressStore, PromoRedemption};
use crate::streak::{self, CheckInOutcome};
use crate::tracking::{plan_event, ProgressEvent};

/// The identity a service acts for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
}

impl Session {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id: user_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self::new(Some(user_id.into()))
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The resolved user id, or `CoreError::NotAuthenticated`.
    pub fn require_user(&self) -> Result<&str> {
        self.user_id().ok_or(CoreError::NotAuthenticated)
    }
}

pub struct ProgressService<S> {
    store: S,
    config: Config,
    session: Session,
    engine: AchievementEngine,
}

impl<S: ProgressStore> ProgressService<S> {
    pub fn new(store: S, config: Config, session: Session) -> Self {
        Self {
            store,
            config,
            session,
            engine: AchievementEngine::default(),
        }
    }

    /// Replace the built-in achievement catalog.
    pub fn with_catalog(mut self, catalog: AchievementCatalog) -> Self {
        self.engine = AchievementEngine::new(catalog);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        self.engine.catalog()
    }

    /// Apply an event to the counters and return achievements it unlocked.
    ///
    /// Goal completions are evaluated with their timing, so time-bound
    /// achievements can fire.
    pub fn record_event(&self, event: &ProgressEvent) -> Result<Vec<UnlockNotice>> {
        let user_id = self.session.require_user()?;

        let tracking = self.store.read_tracking(user_id)?;
        let ops = plan_event(&tracking, event, &self.config.tracking);
        for op in &ops {
            self.store.apply_counter_op(user_id, op)?;
        }
        tracing::debug!(user_id, event = event.kind(), ops = ops.len(), "progress event recorded");

        let completion = CompletionContext::from_event(event);
        self.engine
            .evaluate(&self.store, user_id, completion.as_ref(), Utc::now())
    }

    /// Record an event without surfacing failures to the caller.
    ///
    /// Used after a primary write has committed: a failing counter store is
    /// logged and reported as no unlocks.
    pub fn track(&self, event: &ProgressEvent) -> Vec<UnlockNotice> {
        match self.record_event(event) {
            Ok(unlocked) => {
                if !unlocked.is_empty() {
                    tracing::debug!(event = event.kind(), unlocked = unlocked.len(), "tracked event");
                }
                unlocked
            }
            Err(e) => {
                tracing::warn!(event = event.kind(), error = %e, "failed to track progress event");
                Vec::new()
            }
        }
    }

    /// Re-evaluate the catalog against the current counters.
    pub fn evaluate_achievements(&self) -> Result<Vec<UnlockNotice>> {
        let user_id = self.session.require_user()?;
        self.engine.evaluate(&self.store, user_id, None, Utc::now())
    }

    pub fn list_achievements(&self) -> Result<Vec<AchievementStatus>> {
        let user_id = self.session.require_user()?;
        self.engine.list(&self.store, user_id)
    }

    pub fn snapshot(&self) -> Result<ProgressSnapshot> {
        let user_id = self.session.require_user()?;
        ProgressSnapshot::load(&self.store, user_id)
    }

    /// XP and rank placement; a newly reached rank tier is tracked.
    pub fn compute_rank_xp(&self) -> Result<RankXpData> {
        let user_id = self.session.require_user()?;
        let goals = self.store.list_goals(user_id)?;
        let ranks = self.store.list_ranks(user_id)?;
        let data = rank::compute_rank_xp(&ranks, &goals, self.config.progression.in_progress_damping);

        if let Some(tier) = data.current_tier() {
            let recorded = self.store.read_tracking(user_id)?.current_rank_tier;
            if tier > recorded {
                self.track(&ProgressEvent::RankReached { tier });
            }
        }
        Ok(data)
    }

    /// Insights for today in the host's local calendar.
    pub fn generate_insights(&self) -> Result<Vec<PactInsight>> {
        self.generate_insights_on(Local::now().date_naive())
    }

    pub fn generate_insights_on(&self, today: NaiveDate) -> Result<Vec<PactInsight>> {
        let snapshot = self.snapshot()?;
        Ok(insights::generate_insights(
            snapshot.pact.as_ref(),
            &snapshot.goals,
            today,
            &self.config.insights,
        ))
    }

    /// Check in for today in the host's local calendar.
    pub fn record_check_in(&self) -> Result<CheckInOutcome> {
        self.record_check_in_on(Local::now().date_naive())
    }

    pub fn record_check_in_on(&self, date: NaiveDate) -> Result<CheckInOutcome> {
        let user_id = self.session.require_user()?;
        let previous = self.store.load_health_streak(user_id)?;
        let outcome = streak::check_in(user_id, previous, date, &self.config.streak.milestones);

        if outcome.counted {
            self.store.save_health_streak(&outcome.streak)?;
        }
        if let Some(milestone) = outcome.milestone {
            tracing::info!(user_id, days = milestone.days, "check-in streak milestone");
        }
        Ok(outcome)
    }

    pub fn redeem_promo_code(&self, code: &str) -> Result<PromoRedemption> {
        let user_id = self.session.require_user()?;
        let result = self.store.redeem_promo_code(user_id, code)?;
        match &result.error {
            None => tracing::info!(user_id, "promo code redeemed"),
            Some(reason) => tracing::debug!(user_id, reason = %reason, "promo code rejected"),
        }
        Ok(result)
    }
}
