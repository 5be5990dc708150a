//! Temporal risk aggregation.
//!
//! [`RiskEngine`] loads a user's recent predictions, reduces them with the
//! window, trend and engagement analyzers, runs user-level fusion and writes
//! the profile. The label/`risk_label_since` read-modify-write happens in
//! one immediate transaction, so a label keeps its start time across
//! recomputations until the label itself changes.

pub mod engagement;
pub mod fusion;
pub mod trend;
pub mod window;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{FusionConfig, Thresholds, WindowsConfig};
use crate::db::{self, Database, NewIntervention, NewPrediction};
use crate::error::Error;
use crate::model::{
    ConversationType, Engagement, Intervention, InterventionOutcome, LabelDistribution,
    PredictionVector, RiskLabel, Trend, UserRiskProfile, WindowMetrics,
};

use self::engagement::engagement;
use self::fusion::{assess_message, decide_user, MessageAssessment, UserSignals};
use self::trend::{detect_trend, TrendMetric};
use self::window::window_metrics;

const NO_HISTORY_REASON: &str = "No message history";
/// How far ahead of the local clock a message timestamp may be.
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Outcome of storing one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedMessage {
    pub message_id: i64,
    pub assessment: MessageAssessment,
}

/// Profile computation and persistence for many users.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct RiskEngine {
    db: Database,
    windows: WindowsConfig,
}

impl RiskEngine {
    pub fn new(db: Database, windows: WindowsConfig) -> Self {
        Self { db, windows }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // ========== Ingestion ==========

    /// Validate, classify and store one message.
    ///
    /// The message-level assessment is informational; it is stored with the
    /// message but never feeds the user profile.
    pub fn record_message(
        &self,
        user_id: &str,
        message_text: &str,
        predictions: PredictionVector,
        conversation_type: ConversationType,
        timestamp: Option<DateTime<Utc>>,
        fusion: &FusionConfig,
    ) -> Result<RecordedMessage, Error> {
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user_id must not be empty".to_string()));
        }
        predictions.validate_with_weight(fusion.neg_weight)?;

        let received = Utc::now();
        let timestamp = timestamp.unwrap_or(received);
        if timestamp > received + Duration::seconds(MAX_CLOCK_SKEW_SECS) {
            return Err(Error::InvalidInput(format!(
                "timestamp {} is in the future",
                timestamp.to_rfc3339()
            )));
        }

        let assessment = assess_message(&predictions, &fusion.thresholds);
        let message_id = self.db.store_prediction(&NewPrediction {
            user_id,
            message_text,
            conversation_type,
            timestamp,
            predictions,
            msg_risk_label: Some(assessment.label),
        })?;

        if assessment.toxic_flag {
            info!(user_id, message_id, "Toxic message recorded");
        }
        Ok(RecordedMessage {
            message_id,
            assessment,
        })
    }

    pub fn list_user_ids(&self) -> Result<Vec<String>, Error> {
        self.db.list_user_ids()
    }

    // ========== Profiles ==========

    /// Recompute and persist the profile for `user_id` as of now.
    pub fn compute_profile(
        &self,
        user_id: &str,
        thresholds: &Thresholds,
        last_login: Option<DateTime<Utc>>,
    ) -> Result<UserRiskProfile, Error> {
        self.compute_profile_at(user_id, thresholds, last_login, Utc::now())
    }

    /// Recompute and persist the profile for `user_id` as of `now`.
    pub fn compute_profile_at(
        &self,
        user_id: &str,
        thresholds: &Thresholds,
        last_login: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<UserRiskProfile, Error> {
        let messages = self
            .db
            .get_messages(user_id, self.windows.history_days, now)?;

        if messages.is_empty() {
            debug!(user_id, "No messages in history window");
            let profile = UserRiskProfile {
                user_id: user_id.to_string(),
                current_risk_label: RiskLabel::LowRisk,
                risk_label_since: now,
                reasons: vec![NO_HISTORY_REASON.to_string()],
                short_window: WindowMetrics::default(),
                medium_window: WindowMetrics::default(),
                risk_trend: Trend::Stable,
                isolation_trend: Trend::Stable,
                engagement: Engagement::default(),
                last_login_time: Some(last_login.unwrap_or(now)),
                days_since_last_login: login_age(last_login, now),
                last_updated: now,
            };
            // Only decay a profile that already exists.
            return self.persist(profile, false);
        }

        let short_window = window_metrics(&messages, self.windows.short_days, now);
        let medium_window = window_metrics(&messages, self.windows.medium_days, now);
        let risk_trend = detect_trend(&messages, TrendMetric::RiskScore, now);
        let isolation_trend = detect_trend(&messages, TrendMetric::Isolation, now);
        let engagement = engagement(&messages, now);

        let decision = decide_user(
            &UserSignals {
                short: short_window,
                risk_trend,
                days_since_last_buddy_msg: engagement.days_since_last_buddy_msg,
            },
            thresholds,
        );

        debug!(
            user_id,
            messages = messages.len(),
            label = %decision.label,
            risk_trend = risk_trend.as_str(),
            "Computed user decision"
        );

        let profile = UserRiskProfile {
            user_id: user_id.to_string(),
            current_risk_label: decision.label,
            risk_label_since: now,
            reasons: decision.reasons,
            short_window,
            medium_window,
            risk_trend,
            isolation_trend,
            engagement,
            last_login_time: Some(last_login.unwrap_or(now)),
            days_since_last_login: login_age(last_login, now),
            last_updated: now,
        };
        self.persist(profile, true)
    }

    /// Apply label hysteresis and upsert, in one transaction.
    ///
    /// `risk_label_since` on `profile` is the candidate start time; it is
    /// replaced by the stored one when the label is unchanged.
    fn persist(
        &self,
        mut profile: UserRiskProfile,
        insert_new: bool,
    ) -> Result<UserRiskProfile, Error> {
        self.db.with_transaction(|tx| {
            let prior = db::stored_label(tx, &profile.user_id)?;
            match prior {
                Some(prior) if prior.label == profile.current_risk_label => {
                    profile.risk_label_since = prior.since;
                }
                Some(prior) => {
                    info!(
                        user_id = %profile.user_id,
                        from = %prior.label,
                        to = %profile.current_risk_label,
                        "Risk label changed"
                    );
                }
                None if !insert_new => return Ok(profile),
                None => {
                    info!(
                        user_id = %profile.user_id,
                        label = %profile.current_risk_label,
                        "First risk profile"
                    );
                }
            }
            db::upsert_profile(tx, &profile)?;
            Ok(profile)
        })
    }

    pub fn get_profile(&self, user_id: &str) -> Result<Option<UserRiskProfile>, Error> {
        self.db.get_profile(user_id)
    }

    /// Stored profiles in priority order.
    pub fn list_all_profiles(&self) -> Result<Vec<UserRiskProfile>, Error> {
        self.db.list_profiles()
    }

    /// Users without buddy contact for `days_silent` days who are not already HIGH_RISK.
    pub fn list_silent_users(&self, days_silent: i64) -> Result<Vec<String>, Error> {
        self.db.list_silent_users(days_silent)
    }

    /// Profile counts per label, for operator dashboards.
    pub fn label_distribution(&self) -> Result<LabelDistribution, Error> {
        self.db.label_distribution()
    }

    // ========== Interventions ==========

    /// Append an intervention to the audit log.
    pub fn log_intervention(
        &self,
        user_id: &str,
        intervention_type: &str,
        risk_label: RiskLabel,
        context: &serde_json::Value,
        outcome: InterventionOutcome,
    ) -> Result<i64, Error> {
        let id = self.db.insert_intervention(&NewIntervention {
            user_id,
            timestamp: Utc::now(),
            intervention_type,
            risk_label,
            context,
            outcome,
        })?;
        info!(user_id, intervention_type, id, "Logged intervention");
        Ok(id)
    }

    /// Interventions from the last `days_back` days, newest first.
    pub fn intervention_history(
        &self,
        user_id: &str,
        days_back: i64,
    ) -> Result<Vec<Intervention>, Error> {
        self.db.get_interventions(user_id, days_back, Utc::now())
    }
}

fn login_age(last_login: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    last_login.map(|ts| (now - ts).num_days()).unwrap_or(0)
}
